use glscene::{demos::triangle::TriangleScene, Application, Options};
use tracing::error;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let options = Options::builder()
        .title("LearnOpenGL")
        .window_size(640, 480)
        .clear_color(0.2, 0.3, 0.3)
        .resizable(true)
        .vsync(true)
        .build();
    if let Err(e) = Application::new(options).run(TriangleScene::new()) {
        error!("{e}");
        std::process::exit(1);
    }
}
