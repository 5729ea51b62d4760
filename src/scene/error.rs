use thiserror::Error;

use crate::scene::component::ComponentKind;
use crate::scene::game_object::GameObjectId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("game object {0} no longer exists")]
    StaleId(GameObjectId),
    #[error("cannot parent {child} under {parent}: it is one of its descendants")]
    Cycle {
        child: GameObjectId,
        parent: GameObjectId,
    },
    #[error("a {0} component is already attached")]
    DuplicateComponent(ComponentKind),
    #[error("no {0} component attached")]
    MissingComponent(ComponentKind),
    #[error("the transform component cannot be removed")]
    TransformRequired,
    #[error("invalid mesh '{name}': {reason}")]
    InvalidMesh { name: String, reason: String },
    #[error("invalid texture '{name}': {reason}")]
    InvalidTexture { name: String, reason: String },
}
