use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{avatars, faculties, students};
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(faculty_routes())
        .merge(student_routes())
        .merge(avatar_routes())
}

fn faculty_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/faculties",
            post(faculties::create_faculty).get(faculties::list_faculties),
        )
        .route("/faculties/search", get(faculties::search_faculties))
        .route(
            "/faculties/{id}",
            get(faculties::get_faculty)
                .put(faculties::update_faculty)
                .delete(faculties::delete_faculty),
        )
        .route(
            "/faculties/by-student/{student_id}",
            get(faculties::faculty_by_student),
        )
}

fn student_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/students",
            post(students::create_student).get(students::list_students),
        )
        .route(
            "/students/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/students/by-name/{fragment}", get(students::students_by_name))
        .route("/students/by-gender/{code}", get(students::students_by_gender))
        .route("/students/by-age/{age}", get(students::students_by_age))
        .route("/students/age-range", get(students::students_by_age_range))
        .route(
            "/students/faculty/{faculty_id}",
            get(students::students_of_faculty).delete(students::delete_students_of_faculty),
        )
        .route(
            "/students/faculty/{faculty_id}/count",
            get(students::count_students_of_faculty),
        )
        .route("/students/stats", get(students::student_stats))
        .route("/students/last-five", get(students::last_five_students))
}

fn avatar_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/avatars/{student_id}",
            post(avatars::upload_avatar).delete(avatars::delete_avatar),
        )
        .route("/avatars/{student_id}/from-db", get(avatars::avatar_from_db))
        .route("/avatars/{student_id}/from-file", get(avatars::avatar_from_file))
        .route("/avatars/{student_id}/restore", post(avatars::restore_avatar))
        .route("/avatars/page/{page}", get(avatars::avatars_page))
}
