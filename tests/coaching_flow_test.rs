//! End-to-end flows against a real database.
//!
//! Each test skips itself when TEST_DATABASE_URL is not reachable.

mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;

use common::{coached_pair, database_app, register, send, training_plan};

#[tokio::test]
#[serial]
async fn test_register_then_login_and_me() {
    let Some((app, _pool)) = database_app().await else { return };

    let email = common::unique_email("login");
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": common::TEST_PASSWORD, "name": "Robin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email.to_uppercase(), "password": common::TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "client");

    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], email);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "Wr0ng!Password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
#[serial]
async fn test_logout_revokes_access_token() {
    let Some((app, _pool)) = database_app().await else { return };
    let user = register(&app, "client").await;

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_assign_conflict_then_replace() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, client, client_id) = coached_pair(&app).await;

    let first = training_plan(&app, &trainer, "Base block", 28).await;
    let second = training_plan(&app, &trainer, "Peak block", 14).await;
    let uri = format!("/api/clients/{}/plans/training", client_id);

    let (status, assigned) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": first }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", assigned);
    assert_eq!(assigned["data"]["status"], "active");
    assert_eq!(assigned["data"]["progress"]["current_day"], 1);
    assert_eq!(assigned["data"]["progress"]["days_remaining"], 27);

    let (status, body) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": second }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, replaced) = send(&app, Method::PUT, &uri, Some(&trainer.token), Some(json!({ "plan_id": second }))).await;
    assert_eq!(status, StatusCode::OK, "{}", replaced);
    assert_eq!(replaced["data"]["previous"]["status"], "abandoned");
    assert!(replaced["data"]["previous"]["ended_at"].is_string());
    assert_eq!(replaced["data"]["current"]["plan_id"], second.as_str());

    let (status, current) = send(&app, Method::GET, &uri, Some(&client.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["data"]["plan_title"], "Peak block");

    let (status, history) = send(&app, Method::GET, &format!("{}/history", uri), Some(&trainer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
#[serial]
async fn test_replace_without_open_plan_is_not_found() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, _client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Solo block", 7).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let nutrition_uri = format!("/api/clients/{}/plans/nutrition", client_id);
    let (status, current) = send(&app, Method::GET, &nutrition_uri, Some(&trainer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(current["data"].is_null());
}

#[tokio::test]
#[serial]
async fn test_only_the_coaching_trainer_may_assign() {
    let Some((app, _pool)) = database_app().await else { return };
    let (_trainer, client, client_id) = coached_pair(&app).await;
    let stranger = register(&app, "trainer").await;
    let plan = training_plan(&app, &stranger, "Stranger block", 10).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (status, _) = send(&app, Method::POST, &uri, Some(&stranger.token), Some(json!({ "plan_id": plan }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, &uri, Some(&client.token), Some(json!({ "plan_id": plan }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn test_daily_log_counts_toward_progress() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Tracked block", 10).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (_, assigned) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    let assignment_id = assigned["data"]["id"].as_str().unwrap().to_string();

    let (status, log) = send(
        &app,
        Method::POST,
        "/api/daily-logs",
        Some(&client.token),
        Some(json!({ "is_completed": true, "notes": "felt strong" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", log);
    assert_eq!(log["data"]["assigned_training_plan_id"], assignment_id.as_str());

    // Upserting the same day keeps one log
    let (status, again) = send(&app, Method::POST, "/api/daily-logs", Some(&client.token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["id"], log["data"]["id"]);
    assert_eq!(again["data"]["is_completed"], true);

    let progress_uri = format!("/api/assignments/training/{}/progress", assignment_id);
    let (status, progress) = send(&app, Method::GET, &progress_uri, Some(&trainer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["data"]["total_logs"], 1);
    assert_eq!(progress["data"]["completed_logs"], 1);
    assert_eq!(progress["data"]["completion_percentage"], 100.0);
}

#[tokio::test]
#[serial]
async fn test_assignment_status_transitions() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, _client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Short block", 5).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (_, assigned) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    let status_uri = format!("/api/assignments/training/{}/status", assigned["data"]["id"].as_str().unwrap());

    let (status, done) = send(&app, Method::PATCH, &status_uri, Some(&trainer.token), Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["data"]["status"], "completed");

    let (status, _) = send(&app, Method::PATCH, &status_uri, Some(&trainer.token), Some(json!({ "status": "active" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A closed assignment frees the slot
    let (status, _) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
#[serial]
async fn test_coached_client_cannot_request_again() {
    let Some((app, _pool)) = database_app().await else { return };
    let (_trainer, client, _client_id) = coached_pair(&app).await;
    let other = register(&app, "trainer").await;

    let (_, profile) = send(&app, Method::GET, "/api/users/me/trainer-profile", Some(&other.token), None).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/coaching-requests",
        Some(&client.token),
        Some(json!({ "trainer_profile_id": profile["data"]["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn test_todo_toggle_and_category_delete() {
    let Some((app, _pool)) = database_app().await else { return };
    let user = register(&app, "client").await;

    let (status, category) = send(
        &app,
        Method::POST,
        "/api/todo-categories",
        Some(&user.token),
        Some(json!({ "name": "Errands", "color": "#22aa88" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", category);
    let category_id = category["data"]["id"].as_str().unwrap().to_string();

    let (status, todo) = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(&user.token),
        Some(json!({ "title": "Buy oats", "category_id": category_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", todo);
    assert_eq!(todo["data"]["completed"], false);
    assert_eq!(todo["data"]["status"], "pending");

    let toggle_uri = format!("/api/todos/{}/toggle", todo["data"]["id"].as_str().unwrap());
    let (status, toggled) = send(&app, Method::PATCH, &toggle_uri, Some(&user.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["data"]["completed"], true);
    assert_eq!(toggled["data"]["status"], "completed");

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/todo-categories/{}", category_id),
        Some(&user.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["detached_todos"], 1);

    let (_, reloaded) = send(
        &app,
        Method::GET,
        &format!("/api/todos/{}", todo["data"]["id"].as_str().unwrap()),
        Some(&user.token),
        None,
    )
    .await;
    assert!(reloaded["data"]["category_id"].is_null());
}

#[tokio::test]
#[serial]
async fn test_todos_are_private_to_their_owner() {
    let Some((app, _pool)) = database_app().await else { return };
    let owner = register(&app, "client").await;
    let other = register(&app, "client").await;

    let (_, todo) = send(&app, Method::POST, "/api/todos", Some(&owner.token), Some(json!({ "title": "Stretch" }))).await;
    let uri = format!("/api/todos/{}", todo["data"]["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, &uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_health_metric_summary() {
    let Some((app, _pool)) = database_app().await else { return };
    let client = register(&app, "client").await;

    for (day, weight) in [("2024-05-01", 82.0), ("2024-05-08", 81.2)] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/health-metrics",
            Some(&client.token),
            Some(json!({ "recorded_on": day, "weight_kg": weight })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::POST, "/api/health-metrics", Some(&client.token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "metrics");

    let (status, summary) = send(&app, Method::GET, "/api/health-metrics/summary", Some(&client.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["data"]["entries"], 2);
    assert_eq!(summary["data"]["latest"]["weight_kg"], 81.2);
}

fn days_from_today(days: i64) -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(days)).to_string()
}

#[tokio::test]
#[serial]
async fn test_log_written_before_assignment_counts_toward_it() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Late block", 10).await;

    let (status, early) = send(&app, Method::POST, "/api/daily-logs", Some(&client.token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(early["data"]["assigned_training_plan_id"].is_null());

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (_, assigned) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    let assignment_id = assigned["data"]["id"].as_str().unwrap().to_string();

    let (status, log) = send(
        &app,
        Method::POST,
        "/api/daily-logs",
        Some(&client.token),
        Some(json!({ "is_completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["data"]["id"], early["data"]["id"]);
    assert_eq!(log["data"]["assigned_training_plan_id"], assignment_id.as_str());

    let progress_uri = format!("/api/assignments/training/{}/progress", assignment_id);
    let (_, progress) = send(&app, Method::GET, &progress_uri, Some(&trainer.token), None).await;
    assert_eq!(progress["data"]["total_logs"], 1);
    assert_eq!(progress["data"]["completed_logs"], 1);
}

#[tokio::test]
#[serial]
async fn test_log_outside_plan_window_is_not_linked() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Week block", 7).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (_, assigned) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    let assignment_id = assigned["data"]["id"].as_str().unwrap().to_string();

    let (status, log) = send(
        &app,
        Method::POST,
        "/api/daily-logs",
        Some(&client.token),
        Some(json!({ "log_date": "2020-01-01", "is_completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(log["data"]["assigned_training_plan_id"].is_null());

    let progress_uri = format!("/api/assignments/training/{}/progress", assignment_id);
    let (_, progress) = send(&app, Method::GET, &progress_uri, Some(&trainer.token), None).await;
    assert_eq!(progress["data"]["total_logs"], 0);
    assert_eq!(progress["data"]["completed_logs"], 0);
}

#[tokio::test]
#[serial]
async fn test_future_start_is_assigned_until_it_begins() {
    let Some((app, pool)) = database_app().await else { return };
    let (trainer, client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Future block", 10).await;
    let start = days_from_today(3);

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (status, assigned) = send(
        &app,
        Method::POST,
        &uri,
        Some(&trainer.token),
        Some(json!({ "plan_id": plan, "start_date": start.clone() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", assigned);
    assert_eq!(assigned["data"]["status"], "assigned");
    let assignment_id = assigned["data"]["id"].as_str().unwrap().to_string();

    // A log on the first plan day links even before the plan is activated
    let (_, log) = send(
        &app,
        Method::POST,
        "/api/daily-logs",
        Some(&client.token),
        Some(json!({ "log_date": start })),
    )
    .await;
    assert_eq!(log["data"]["assigned_training_plan_id"], assignment_id.as_str());

    sqlx::query("UPDATE assigned_training_plans SET start_date = $2 WHERE id = $1")
        .bind(uuid::Uuid::parse_str(&assignment_id).unwrap())
        .bind(chrono::Utc::now().date_naive())
        .execute(&pool)
        .await
        .unwrap();

    let (status, current) = send(&app, Method::GET, &uri, Some(&client.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["data"]["status"], "active");
}

#[tokio::test]
#[serial]
async fn test_replace_after_last_day_completes_previous() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, _client, client_id) = coached_pair(&app).await;
    let finished = training_plan(&app, &trainer, "Finished block", 5).await;
    let next = training_plan(&app, &trainer, "Next block", 5).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&trainer.token),
        Some(json!({ "plan_id": finished, "start_date": days_from_today(-10) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, replaced) = send(&app, Method::PUT, &uri, Some(&trainer.token), Some(json!({ "plan_id": next }))).await;
    assert_eq!(status, StatusCode::OK, "{}", replaced);
    assert_eq!(replaced["data"]["previous"]["status"], "completed");
    assert_eq!(replaced["data"]["current"]["status"], "active");
}

#[tokio::test]
#[serial]
async fn test_assign_unknown_plan_is_not_found_even_with_open_plan() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, _client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Open block", 7).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&trainer.token),
        Some(json!({ "plan_id": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_status_body_errors_use_envelope() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, _client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Envelope block", 7).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    let (_, assigned) = send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;
    let status_uri = format!("/api/assignments/training/{}/status", assigned["data"]["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PATCH, &status_uri, Some(&trainer.token), Some(json!({ "status": "paused" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[serial]
async fn test_assigned_template_cannot_be_deleted() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, _client, client_id) = coached_pair(&app).await;
    let plan = training_plan(&app, &trainer, "Kept block", 7).await;

    let uri = format!("/api/clients/{}/plans/training", client_id);
    send(&app, Method::POST, &uri, Some(&trainer.token), Some(json!({ "plan_id": plan }))).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/training-plans/{}", plan),
        Some(&trainer.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
#[serial]
async fn test_catalogue_items_in_templates_cannot_be_deleted() {
    let Some((app, _pool)) = database_app().await else { return };
    let trainer = register(&app, "trainer").await;

    let (_, exercise) = send(
        &app,
        Method::POST,
        "/api/exercises",
        Some(&trainer.token),
        Some(json!({ "name": "Deadlift", "muscle_group": "Back" })),
    )
    .await;
    let exercise_id = exercise["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/training-plans",
        Some(&trainer.token),
        Some(json!({
            "title": "Pull block",
            "duration_days": 7,
            "items": [{ "exercise_id": exercise_id, "day_number": 1, "sets": 5, "reps": 5 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, meal) = send(
        &app,
        Method::POST,
        "/api/meals",
        Some(&trainer.token),
        Some(json!({ "name": "Overnight oats", "calories": 420.0, "protein_g": 18.0 })),
    )
    .await;
    let meal_id = meal["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/nutrition-plans",
        Some(&trainer.token),
        Some(json!({
            "title": "Lean week",
            "duration_days": 7,
            "items": [{ "meal_id": meal_id, "day_number": 1 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/exercises/{}", exercise_id), Some(&trainer.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/meals/{}", meal_id), Some(&trainer.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn test_log_entries_use_only_own_trainer_catalogue() {
    let Some((app, _pool)) = database_app().await else { return };
    let (trainer, client, _client_id) = coached_pair(&app).await;
    let stranger = register(&app, "trainer").await;

    let meal_for = |name: &'static str| json!({ "name": name, "calories": 300.0 });
    let (_, own_meal) = send(&app, Method::POST, "/api/meals", Some(&trainer.token), Some(meal_for("Rice bowl"))).await;
    let (_, foreign_meal) = send(&app, Method::POST, "/api/meals", Some(&stranger.token), Some(meal_for("Secret shake"))).await;
    let (_, foreign_exercise) = send(
        &app,
        Method::POST,
        "/api/exercises",
        Some(&stranger.token),
        Some(json!({ "name": "Secret press", "muscle_group": "Chest" })),
    )
    .await;

    let (_, log) = send(&app, Method::POST, "/api/daily-logs", Some(&client.token), Some(json!({}))).await;
    let entries_uri = format!("/api/daily-logs/{}/entries", log["data"]["id"].as_str().unwrap());

    let (status, entry) = send(
        &app,
        Method::POST,
        &entries_uri,
        Some(&client.token),
        Some(json!({ "entry_type": "meal", "meal_id": own_meal["data"]["id"], "servings": 2.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", entry);
    assert_eq!(entry["data"]["calories"], 600.0);

    let (status, _) = send(
        &app,
        Method::POST,
        &entries_uri,
        Some(&client.token),
        Some(json!({ "entry_type": "meal", "meal_id": foreign_meal["data"]["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &entries_uri,
        Some(&client.token),
        Some(json!({ "entry_type": "exercise", "exercise_id": foreign_exercise["data"]["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_blank_todo_title_is_rejected() {
    let Some((app, _pool)) = database_app().await else { return };
    let user = register(&app, "client").await;

    let (status, body) = send(&app, Method::POST, "/api/todos", Some(&user.token), Some(json!({ "title": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "title");
}

#[tokio::test]
#[serial]
async fn test_todo_update_clears_nullable_fields() {
    let Some((app, _pool)) = database_app().await else { return };
    let user = register(&app, "client").await;

    let (_, category) = send(
        &app,
        Method::POST,
        "/api/todo-categories",
        Some(&user.token),
        Some(json!({ "name": "Kitchen", "color": "#112233" })),
    )
    .await;
    let (_, todo) = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(&user.token),
        Some(json!({
            "title": "Meal prep",
            "description": "Sunday batch",
            "category_id": category["data"]["id"],
            "due_date": "2030-01-01",
        })),
    )
    .await;
    let uri = format!("/api/todos/{}", todo["data"]["id"].as_str().unwrap());

    let (status, kept) = send(&app, Method::PUT, &uri, Some(&user.token), Some(json!({ "title": "Meal prep x2" }))).await;
    assert_eq!(status, StatusCode::OK, "{}", kept);
    assert_eq!(kept["data"]["category_id"], category["data"]["id"]);
    assert_eq!(kept["data"]["description"], "Sunday batch");

    let (status, cleared) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&user.token),
        Some(json!({ "category_id": null, "description": null, "due_date": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", cleared);
    assert!(cleared["data"]["category_id"].is_null());
    assert!(cleared["data"]["description"].is_null());
    assert!(cleared["data"]["due_date"].is_null());
    assert_eq!(cleared["data"]["title"], "Meal prep x2");
}
