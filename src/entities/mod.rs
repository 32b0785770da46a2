pub mod task;
pub mod user;

pub use task::{generate_task_id, NewTask, Priority, Task, TaskPatch};
pub use user::User;
