use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use school_core::{
    ids::{FacultyId, StudentId},
    service::{
        roster::Teardown,
        students::{NewStudent, StudentChanges, StudentView},
    },
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FacultyParam {
    pub faculty_id: FacultyId,
}

#[derive(Debug, Deserialize)]
pub struct StudentBody {
    pub name: String,
    pub age: i32,
    pub gender: String,
}

#[derive(Debug, Deserialize)]
pub struct AgeRange {
    pub min_age: i32,
    pub max_age: i32,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub count: u64,
    pub average_age: Option<f64>,
}

fn views(students: Vec<school_core::entity::prelude::StudentModel>) -> Json<Vec<StudentView>> {
    Json(students.into_iter().map(Into::into).collect())
}

#[instrument(skip(state, body), fields(name = %body.name))]
pub async fn create_student(
    State(state): State<AppState>,
    Query(param): Query<FacultyParam>,
    Json(body): Json<StudentBody>,
) -> Result<Json<StudentView>, AppError> {
    let student = state
        .core
        .students
        .add_student(NewStudent {
            name: body.name,
            age: body.age,
            gender: body.gender,
            faculty_id: param.faculty_id,
        })
        .await?;
    Ok(Json(student.into()))
}

pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(state.core.students.list_students().await?))
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
) -> Result<Json<StudentView>, AppError> {
    let student = state.core.students.get_student(id).await?;
    Ok(Json(student.into()))
}

#[instrument(skip(state, body))]
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
    Json(body): Json<StudentChanges>,
) -> Result<Json<StudentView>, AppError> {
    let student = state.core.students.update_student(id, body).await?;
    Ok(Json(student.into()))
}

#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<StudentId>,
) -> Result<StatusCode, AppError> {
    if state.core.students.delete_student(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("student {id} not found")))
    }
}

pub async fn students_by_name(
    State(state): State<AppState>,
    Path(fragment): Path<String>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(
        state.core.students.find_by_name_containing(&fragment).await?,
    ))
}

pub async fn students_by_gender(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(state.core.students.find_by_gender(&code).await?))
}

pub async fn students_by_age(
    State(state): State<AppState>,
    Path(age): Path<i32>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(state.core.students.find_by_age(age).await?))
}

pub async fn students_by_age_range(
    State(state): State<AppState>,
    Query(range): Query<AgeRange>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(
        state
            .core
            .students
            .find_by_age_range(range.min_age, range.max_age)
            .await?,
    ))
}

pub async fn students_of_faculty(
    State(state): State<AppState>,
    Path(faculty_id): Path<FacultyId>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(state.core.students.list_by_faculty(faculty_id).await?))
}

#[instrument(skip(state))]
pub async fn delete_students_of_faculty(
    State(state): State<AppState>,
    Path(faculty_id): Path<FacultyId>,
) -> Result<Json<Teardown>, AppError> {
    let teardown = state
        .core
        .students
        .delete_all_students_from_faculty(faculty_id)
        .await?;
    Ok(Json(teardown))
}

pub async fn count_students_of_faculty(
    State(state): State<AppState>,
    Path(faculty_id): Path<FacultyId>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.core.students.count_by_faculty(faculty_id).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn student_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let count = state.core.students.count_students().await?;
    let average_age = state.core.students.average_age().await?;
    Ok(Json(StatsResponse { count, average_age }))
}

pub async fn last_five_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentView>>, AppError> {
    Ok(views(state.core.students.last_five().await?))
}
