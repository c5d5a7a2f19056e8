mod handler;
mod model;

pub use handler::{
    create_todo, delete_any_todo, delete_todo, get_todo, list_all_todos, list_todos, update_todo,
};
pub use model::{CreateTodoRequest, MAX_TITLE_LEN, Todo, UpdateTodoRequest, validate_title};
