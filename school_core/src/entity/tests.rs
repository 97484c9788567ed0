#[cfg(test)]
mod entity_tests {
    use crate::entity::prelude::*;
    use crate::test_utils::setup_test_db;

    async fn insert_faculty(db: &DatabaseConnection, name: &str) -> FacultyModel {
        FacultyActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            name_key: Set(name.to_lowercase()),
            color: Set("Scarlet".to_string()),
            color_key: Set("scarlet".to_string()),
        }
        .insert(db)
        .await
        .expect("Failed to insert faculty")
    }

    async fn insert_student(
        db: &DatabaseConnection,
        name: &str,
        gender: Gender,
        faculty: &FacultyModel,
    ) -> StudentModel {
        StudentActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            name_key: Set(name.to_lowercase()),
            age: Set(11),
            gender: Set(gender),
            faculty_id: Set(Some(faculty.id)),
        }
        .insert(db)
        .await
        .expect("Failed to insert student")
    }

    #[tokio::test]
    async fn test_create_and_find_faculty() {
        let db = setup_test_db().await;

        let faculty = insert_faculty(&db, "Gryffindor").await;

        let found = Faculty::find_by_id(faculty.id)
            .one(&db)
            .await
            .expect("Failed to query faculty");

        assert_eq!(found, Some(faculty));
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_order() {
        let db = setup_test_db().await;

        let first = insert_faculty(&db, "Gryffindor").await;
        let second = insert_faculty(&db, "Slytherin").await;

        assert!(first.id < second.id);
    }

    #[tokio::test]
    async fn test_faculty_name_key_is_unique() {
        let db = setup_test_db().await;
        insert_faculty(&db, "Gryffindor").await;

        let duplicate = FacultyActiveModel {
            id: NotSet,
            name: Set("GRYFFINDOR".to_string()),
            name_key: Set("gryffindor".to_string()),
            color: Set("Gold".to_string()),
            color_key: Set("gold".to_string()),
        };

        let result = duplicate.insert(&db).await;
        assert!(result.is_err(), "Folded name should be unique");
    }

    #[tokio::test]
    async fn test_student_name_key_is_unique() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Gryffindor").await;
        insert_student(&db, "Harry", Gender::Male, &faculty).await;

        let duplicate = StudentActiveModel {
            id: NotSet,
            name: Set("HARRY".to_string()),
            name_key: Set("harry".to_string()),
            age: Set(12),
            gender: Set(Gender::Male),
            faculty_id: Set(Some(faculty.id)),
        };

        let result = duplicate.insert(&db).await;
        assert!(result.is_err(), "Folded student name should be unique");
    }

    #[tokio::test]
    async fn test_gender_round_trip() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Gryffindor").await;

        let hermione = insert_student(&db, "Hermione", Gender::Female, &faculty).await;
        let found = Student::find_by_id(hermione.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.gender, Gender::Female);

        let girls = Student::find()
            .filter(StudentColumn::Gender.eq(Gender::Female))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(girls.len(), 1);
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::parse("М"), Some(Gender::Male));
        assert_eq!(Gender::parse(" ж "), Some(Gender::Female));
        assert_eq!(Gender::parse("m"), None);
        assert_eq!(Gender::Male.code(), "м");
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"ж\"");
    }

    #[tokio::test]
    async fn test_student_requires_existing_faculty() {
        let db = setup_test_db().await;

        let orphan = StudentActiveModel {
            id: NotSet,
            name: Set("Nobody".to_string()),
            name_key: Set("nobody".to_string()),
            age: Set(11),
            gender: Set(Gender::Male),
            faculty_id: Set(Some(crate::ids::FacultyId::from_i64(404))),
        };

        let result = orphan.insert(&db).await;
        assert!(result.is_err(), "Foreign key should reject unknown faculty");
    }

    #[tokio::test]
    async fn test_faculty_delete_is_restricted_while_students_exist() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Gryffindor").await;
        insert_student(&db, "Harry", Gender::Male, &faculty).await;

        let result = Faculty::delete_by_id(faculty.id).exec(&db).await;
        assert!(result.is_err(), "Foreign key should restrict the delete");
    }

    #[tokio::test]
    async fn test_find_related_students_and_avatar() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Gryffindor").await;
        let harry = insert_student(&db, "Harry", Gender::Male, &faculty).await;
        insert_student(&db, "Ron", Gender::Male, &faculty).await;

        AvatarActiveModel {
            id: NotSet,
            student_id: Set(harry.id),
            file_path: Set("/avatars/1.png".to_string()),
            file_size: Set(4),
            media_type: Set("image/png".to_string()),
            data: Set(vec![1, 2, 3, 4]),
        }
        .insert(&db)
        .await
        .unwrap();

        let students = faculty.find_related(Student).all(&db).await.unwrap();
        assert_eq!(students.len(), 2);

        let avatar = harry.find_related(Avatar).one(&db).await.unwrap().unwrap();
        assert_eq!(avatar.data, vec![1, 2, 3, 4]);

        let owner = avatar.find_related(Student).one(&db).await.unwrap().unwrap();
        assert_eq!(owner.id, harry.id);
    }

    #[tokio::test]
    async fn test_one_avatar_per_student() {
        let db = setup_test_db().await;
        let faculty = insert_faculty(&db, "Gryffindor").await;
        let harry = insert_student(&db, "Harry", Gender::Male, &faculty).await;

        let avatar = |path: &str| AvatarActiveModel {
            id: NotSet,
            student_id: Set(harry.id),
            file_path: Set(path.to_string()),
            file_size: Set(1),
            media_type: Set("image/png".to_string()),
            data: Set(vec![0]),
        };

        avatar("/avatars/1.png").insert(&db).await.unwrap();
        let second = avatar("/avatars/1.jpg").insert(&db).await;
        assert!(second.is_err(), "student_id should be unique");
    }

    #[test]
    fn test_avatar_json_omits_data() {
        let avatar = AvatarModel {
            id: crate::ids::AvatarId::from_i64(1),
            student_id: crate::ids::StudentId::from_i64(2),
            file_path: "/avatars/2.png".to_string(),
            file_size: 3,
            media_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };

        let json = serde_json::to_value(&avatar).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["student_id"], 2);
    }
}
