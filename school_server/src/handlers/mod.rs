pub mod avatars;
pub mod faculties;
pub mod students;
