// Game layer: configuration, entities and the forest scene

pub mod config;
pub mod entities;
pub mod error;
pub mod scene;

pub use config::GameConfig;
pub use scene::Scene;

#[allow(unused_imports)]
pub use error::GameError;
#[allow(unused_imports)]
pub use scene::SceneView;
