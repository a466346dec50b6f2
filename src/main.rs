use actix_cors::Cors;
use actix_files as fs;
use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use snapgram::api;
use snapgram::config::Config;
use snapgram::db;
use snapgram::storage;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );

    let pool = db::create_pool(&config)
        .await
        .expect("Failed to open database");

    storage::init_upload_dir(&config)
        .await
        .expect("Failed to create upload directory");

    log::info!("Database ready at {}", config.database.path);

    let openapi = api::ApiDoc::openapi();

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let upload_dir = config.storage.upload_dir.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(pool.clone()))
            .route(
                "/api/docs",
                web::get().to(|| async {
                    actix_web::HttpResponse::PermanentRedirect()
                        .append_header(("Location", "/api/docs/"))
                        .finish()
                }),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(api::auth::signup))
                            .route("/login", web::post().to(api::auth::login)),
                    )
                    .route("/me", web::get().to(api::users::get_me))
                    .route("/me", web::put().to(api::users::update_me))
                    .route("/explore", web::get().to(api::posts::explore))
                    .service(
                        web::scope("/posts")
                            .route("", web::get().to(api::posts::get_posts))
                            .route("", web::post().to(api::posts::create_post))
                            .route("/{post_id}", web::delete().to(api::posts::delete_post))
                            .route("/{post_id}/like", web::post().to(api::posts::like_post))
                            .route("/{post_id}/save", web::post().to(api::posts::save_post))
                            .route("/{post_id}/comments", web::get().to(api::posts::get_comments))
                            .route("/{post_id}/comments", web::post().to(api::posts::add_comment)),
                    )
                    .service(
                        // Literal segments are registered ahead of the
                        // {username} catch-all so /suggestions and
                        // /search resolve first.
                        web::scope("/users")
                            .route("", web::get().to(api::users::list_users))
                            .route("/suggestions", web::get().to(api::users::suggestions))
                            .route("/search", web::get().to(api::users::search_users))
                            .route("/{user_id}/follow", web::post().to(api::users::follow_user))
                            .route("/{username}/saved", web::get().to(api::users::saved_posts))
                            .route("/{username}", web::get().to(api::users::get_profile)),
                    ),
            )
            .service(fs::Files::new("/uploads", &upload_dir))
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
