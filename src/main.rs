#[actix_web::main]
async fn main() -> std::io::Result<()> {
    vsp_server::app::run().await
}
