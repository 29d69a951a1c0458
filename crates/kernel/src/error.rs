use cellworld_common::ActorId;
use cellworld_map::MapError;

/// Alias for `Result<T, KernelError>`.
pub type KernelResult<T> = Result<T, KernelError>;

/// Contract violations detected by the kernel.
///
/// Expected negative outcomes such as a blocked path are plain values and
/// never show up here.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("actor {0} does not exist")]
    ActorNotFound(ActorId),
    #[error("actor {0} is already in the world")]
    AlreadyInWorld(ActorId),
    #[error("actor {0} is not in the world")]
    NotInWorld(ActorId),
    #[error("no trait of kind {kind} on actor {actor}")]
    TraitNotFound { actor: ActorId, kind: String },
    #[error("{count} traits of kind {kind} on actor {actor}, expected exactly one")]
    AmbiguousTrait {
        actor: ActorId,
        kind: String,
        count: usize,
    },
    #[error("trait {kind} on actor {actor} is already being dispatched")]
    TraitBusy { actor: ActorId, kind: &'static str },
    #[error("trait kind \"{0}\" is already registered")]
    DuplicateTraitKind(String),
    #[error("actor definition \"{0}\" is already registered")]
    DuplicateActorDefinition(String),
    #[error("unknown trait kind \"{0}\"")]
    UnknownTraitKind(String),
    #[error("unknown actor definition \"{0}\"")]
    UnknownActorDefinition(String),
    #[error("invalid parameters for trait {kind}: {reason}")]
    InvalidParameters { kind: String, reason: String },
    #[error("main thread dispatcher is closed")]
    DispatchClosed,
    #[error("dispatched call was dropped before completing")]
    DispatchAborted,
    #[error(transparent)]
    Map(#[from] MapError),
}
