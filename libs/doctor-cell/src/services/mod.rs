pub mod availability;
pub mod doctor;
pub mod persistence;
pub mod schedule;

pub use doctor::DoctorService;
pub use persistence::{RestSchedulePersistence, SchedulePersistence};
pub use schedule::{save_editor, ScheduleEditor, ScheduleEditorStore};
