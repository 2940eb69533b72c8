//! The Labels object model (spec §3).

pub mod frame;
pub mod instance;
pub mod labels;
pub mod point;
pub mod provenance;
pub mod session;
pub mod skeleton;
pub mod suggestion;
pub mod track;
pub mod video;

pub use frame::LabeledFrame;
pub use instance::{Instance, LabeledInstance, PredictedInstance};
pub use labels::Labels;
pub use point::{Point, PredictedPoint};
pub use provenance::Provenance;
pub use session::{Camera, CameraGroup, FrameGroup, InstanceGroup, RecordingSession};
pub use skeleton::{Edge, Node, Skeleton, Symmetry};
pub use suggestion::Suggestion;
pub use track::Track;
pub use video::{ChannelOrder, Video, VideoBackend};
