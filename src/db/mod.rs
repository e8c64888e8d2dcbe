pub mod init;
pub mod meetings;
pub mod recordings;
pub mod schemas;
pub mod users;

pub use init::{init_db, migrate};
pub use meetings::MeetingRepository;
pub use recordings::{NewRecording, RecordingRepository};
pub use schemas::{Meeting, MeetingStatus, MeetingType, Recording, RemoteUserAccount};
pub use users::UserRepository;
