pub mod draft;
pub mod model;
pub mod session;
pub mod stage;

pub use draft::{AudioSource, DraftError, SessionDraft};
pub use model::{AudioVariant, JobStatus, NewMessage, ProducerMessage, Role, SessionMeta, Version};
pub use session::{SessionState, SessionStore, StoreError, SubscriptionId};
pub use stage::{CoachingPrompt, Stage, StageMap};
