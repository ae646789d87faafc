//! Data models
//!
//! Database entities (User, Session, Assignment, Week, Resource, Comment) and
//! the input types accepted by the services.

mod assignment;
mod comment;
mod query;
mod resource;
mod session;
mod user;
mod week;

pub use assignment::{Assignment, CreateAssignmentInput, UpdateAssignmentInput};
pub use comment::{Comment, CommentInput, CommentTarget, CommentView};
pub use query::{ListQuery, SortOrder};
pub use resource::{CreateResourceInput, Resource, UpdateResourceInput};
pub use session::{Session, SessionData};
pub use user::{
    ChangePasswordInput, CreateStudentInput, Student, StudentSort, UpdateStudentInput, User,
};
pub use week::{CreateWeekInput, UpdateWeekInput, Week, WeekSort};
