use axum::{
    extract::{Path, Query, State},
    Json,
};
use school_core::{
    ids::{FacultyId, StudentId},
    service::{
        faculties::{FacultyView, NewFaculty},
        roster::Teardown,
    },
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[instrument(skip(state, body), fields(name = %body.name))]
pub async fn create_faculty(
    State(state): State<AppState>,
    Json(body): Json<NewFaculty>,
) -> Result<Json<FacultyView>, AppError> {
    let faculty = state.core.faculties.add_faculty(body).await?;
    Ok(Json(faculty.into()))
}

pub async fn list_faculties(
    State(state): State<AppState>,
) -> Result<Json<Vec<FacultyView>>, AppError> {
    let faculties = state.core.faculties.list_faculties().await?;
    Ok(Json(faculties.into_iter().map(Into::into).collect()))
}

pub async fn search_faculties(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FacultyView>>, AppError> {
    let faculties = state
        .core
        .faculties
        .search_by_name_or_color(params.name.as_deref(), params.color.as_deref())
        .await?;
    Ok(Json(faculties.into_iter().map(Into::into).collect()))
}

pub async fn get_faculty(
    State(state): State<AppState>,
    Path(id): Path<FacultyId>,
) -> Result<Json<FacultyView>, AppError> {
    let faculty = state.core.faculties.get_faculty(id).await?;
    Ok(Json(faculty.into()))
}

#[instrument(skip(state, body))]
pub async fn update_faculty(
    State(state): State<AppState>,
    Path(id): Path<FacultyId>,
    Json(body): Json<NewFaculty>,
) -> Result<Json<FacultyView>, AppError> {
    let faculty = state.core.faculties.update_faculty(id, body).await?;
    Ok(Json(faculty.into()))
}

#[instrument(skip(state))]
pub async fn delete_faculty(
    State(state): State<AppState>,
    Path(id): Path<FacultyId>,
) -> Result<Json<Teardown>, AppError> {
    let teardown = state.core.faculties.delete_faculty(id).await?;
    Ok(Json(teardown))
}

pub async fn faculty_by_student(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<FacultyView>, AppError> {
    let faculty = state
        .core
        .faculties
        .get_faculty_by_student_id(student_id)
        .await?;
    Ok(Json(faculty))
}
