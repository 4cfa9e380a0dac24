pub mod completion;
pub mod domain;
pub mod encoder;
pub mod error;
pub mod ports;
pub mod query;
pub mod service;
pub mod validator;

pub use domain::{
    can_edit, EncodedFile, FileKind, Grade, GradeProgress, Lecture, LectureDraft, Role, Topic,
    TopicFilter, User,
};
pub use error::{CatalogError, CatalogResult, RequiredField};
pub use ports::{CatalogStore, PortError, PortResult};
pub use service::CatalogService;
