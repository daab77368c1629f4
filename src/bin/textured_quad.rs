use std::path::PathBuf;

use glscene::{
    demos::textured_quad::{default_texture_path, TexturedQuadScene},
    Application, Options,
};
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let texture_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_texture_path);
    info!(texture = %texture_path.display(), "Starting textured quad");

    let options = Options::builder()
        .title("LearnTexture")
        .window_size(640, 480)
        .vsync(true)
        .resizable(true)
        .build();
    if let Err(e) = Application::new(options).run(TexturedQuadScene::new(texture_path)) {
        error!("{e}");
        std::process::exit(1);
    }
}
