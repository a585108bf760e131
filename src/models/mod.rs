pub mod todo;
pub mod user;

pub use todo::{ToDo, ToDoInput, ToDoResponse, USER_TODOS_LIMIT};
pub use user::{User, UserProfile};
