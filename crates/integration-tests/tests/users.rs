//! Account and role behavior against a live database.
//!
//! Run with a PostgreSQL instance and `GROCER_TEST_DATABASE_URL` set:
//! `cargo test -p greengrocer-integration-tests -- --ignored`

use greengrocer_integration_tests::{create_customer, test_pool, unique};
use greengrocer_storefront::db::users::ProfileUpdate;
use greengrocer_storefront::services::users::Registration;
use greengrocer_storefront::services::{ServiceError, UserService};

fn registration(email: &str) -> Registration {
    Registration {
        first_name: "Pat".to_owned(),
        last_name: "Jones".to_owned(),
        email: email.to_owned(),
        password: "password123".to_owned(),
        phone: Some("555-0199".to_owned()),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn duplicate_email_registration_is_rejected() {
    let pool = test_pool().await;
    let users = UserService::new(&pool);
    let email = format!("{}@test.example", unique("dup"));

    users.register(&registration(&email)).await.expect("first");

    let err = users
        .register(&registration(&email))
        .await
        .expect_err("same email again");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // The duplicate check is exact and case-sensitive: a different casing
    // registers as a distinct account.
    let upper = email.to_uppercase();
    users
        .register(&registration(&upper))
        .await
        .expect("different casing is a different email");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn login_matches_credentials_exactly() {
    let pool = test_pool().await;
    let users = UserService::new(&pool);
    let email = format!("{}@test.example", unique("login"));
    users.register(&registration(&email)).await.expect("register");

    let user = users.login(&email, "password123").await.expect("login");
    assert_eq!(user.email.as_str(), email);

    let err = users
        .login(&email, "wrong-password")
        .await
        .expect_err("bad password");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    let err = users
        .login("not-an-email", "password123")
        .await
        .expect_err("malformed email gets the same generic answer");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn profile_update_keeps_password_when_absent() {
    let pool = test_pool().await;
    let users = UserService::new(&pool);
    let email = format!("{}@test.example", unique("profile"));
    let user = users.register(&registration(&email)).await.expect("register");

    let updated = users
        .update_profile(
            user.id,
            &ProfileUpdate {
                first_name: "Patricia".to_owned(),
                last_name: "Jones".to_owned(),
                phone: None,
                password: None,
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.first_name, "Patricia");
    assert_eq!(updated.phone, None);

    // Old password still works because none was supplied.
    users.login(&email, "password123").await.expect("login");

    // Supplying one rotates it.
    users
        .update_profile(
            user.id,
            &ProfileUpdate {
                first_name: "Patricia".to_owned(),
                last_name: "Jones".to_owned(),
                phone: None,
                password: Some("new-password".to_owned()),
            },
        )
        .await
        .expect("rotate");
    users.login(&email, "new-password").await.expect("new login");
    let err = users
        .login(&email, "password123")
        .await
        .expect_err("old password dead");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn role_flags_toggle_and_delete_is_destructive() {
    let pool = test_pool().await;
    let users = UserService::new(&pool);
    let user = create_customer(&pool).await;

    let promoted = users.set_employee(user.id, true).await.expect("promote");
    assert!(promoted.is_employee);
    assert!(promoted.is_staff());
    assert!(!promoted.is_admin);

    let promoted = users.set_admin(user.id, true).await.expect("admin");
    assert!(promoted.is_admin);

    let demoted = users.set_employee(user.id, false).await.expect("demote");
    assert!(!demoted.is_employee);
    // Still staff through the admin flag.
    assert!(demoted.is_staff());

    users.delete_customer(user.id).await.expect("delete");
    let err = users.user(user.id).await.expect_err("gone");
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = users
        .delete_customer(user.id)
        .await
        .expect_err("already gone");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn customer_search_matches_name_email_and_phone() {
    let pool = test_pool().await;
    let users = UserService::new(&pool);
    let marker = unique("findme");
    let email = format!("{marker}@test.example");
    users.register(&registration(&email)).await.expect("register");

    let page = users
        .list_customers(Some(&marker), 0, 10, Default::default(), Default::default())
        .await
        .expect("search");
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].email.as_str(), email);

    let page = users
        .list_customers(
            Some("no-such-user-anywhere"),
            0,
            10,
            Default::default(),
            Default::default(),
        )
        .await
        .expect("miss");
    assert_eq!(page.total_items, 0);
}
