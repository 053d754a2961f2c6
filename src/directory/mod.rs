//! User directory: account records, their role, and the admin/self-service
//! user API.
//!
//! Repository functions here take a `&mut PgConnection` and are meant to be
//! called inside [`crate::core::shared::utils::with_conn`].

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::shared::models::{NewRole, NewUser, RoleRecord, User};
use crate::core::shared::schema;
use crate::security::auth_api::Role;

pub mod router;
pub mod users;

pub use router::configure;

pub type UserWithRole = (User, RoleRecord);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
}

impl From<UserWithRole> for UserResponse {
    fn from((user, role): UserWithRole) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: role.name,
        }
    }
}

/// Stored role names outside the known set fall back to STUDENT.
pub fn role_of(record: &RoleRecord) -> Role {
    Role::parse(&record.name).unwrap_or_default()
}

pub fn find_or_create_role(conn: &mut PgConnection, role: Role) -> QueryResult<RoleRecord> {
    diesel::insert_into(schema::roles::table)
        .values(&NewRole {
            name: role.stored_name(),
        })
        .on_conflict(schema::roles::name)
        .do_nothing()
        .execute(conn)?;

    schema::roles::table
        .filter(schema::roles::name.eq(role.stored_name()))
        .select(RoleRecord::as_select())
        .first(conn)
}

pub fn find_user(conn: &mut PgConnection, user_id: i64) -> QueryResult<Option<UserWithRole>> {
    schema::users::table
        .inner_join(schema::roles::table)
        .filter(schema::users::id.eq(user_id))
        .select((User::as_select(), RoleRecord::as_select()))
        .first(conn)
        .optional()
}

pub fn find_user_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> QueryResult<Option<UserWithRole>> {
    schema::users::table
        .inner_join(schema::roles::table)
        .filter(schema::users::username.eq(username))
        .select((User::as_select(), RoleRecord::as_select()))
        .first(conn)
        .optional()
}

pub fn username_exists(conn: &mut PgConnection, username: &str) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        schema::users::table.filter(schema::users::username.eq(username)),
    ))
    .get_result(conn)
}

/// True when a user other than `except_id` already holds `email`.
pub fn email_taken(
    conn: &mut PgConnection,
    email: &str,
    except_id: Option<i64>,
) -> QueryResult<bool> {
    let mut query = schema::users::table
        .filter(schema::users::email.eq(email))
        .select(schema::users::id)
        .into_boxed();
    if let Some(id) = except_id {
        query = query.filter(schema::users::id.ne(id));
    }
    Ok(query.first::<i64>(conn).optional()?.is_some())
}

pub fn list_users(conn: &mut PgConnection, role: Option<Role>) -> QueryResult<Vec<UserWithRole>> {
    let mut query = schema::users::table
        .inner_join(schema::roles::table)
        .select((User::as_select(), RoleRecord::as_select()))
        .order(schema::users::id.asc())
        .into_boxed();
    if let Some(role) = role {
        query = query.filter(schema::roles::name.eq(role.stored_name()));
    }
    query.load(conn)
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: Option<&'a str>,
    pub role: Role,
}

pub fn insert_user(conn: &mut PgConnection, account: NewAccount<'_>) -> QueryResult<UserWithRole> {
    let role = find_or_create_role(conn, account.role)?;
    let now = Utc::now();

    let user = diesel::insert_into(schema::users::table)
        .values(&NewUser {
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            full_name: account.full_name,
            role_id: role.id,
            created_at: now,
            updated_at: now,
        })
        .returning(User::as_returning())
        .get_result(conn)?;

    Ok((user, role))
}

pub fn update_profile(
    conn: &mut PgConnection,
    user_id: i64,
    full_name: &str,
    email: &str,
) -> QueryResult<UserWithRole> {
    let user = diesel::update(schema::users::table.find(user_id))
        .set((
            schema::users::full_name.eq(Some(full_name)),
            schema::users::email.eq(email),
            schema::users::updated_at.eq(Utc::now()),
        ))
        .returning(User::as_returning())
        .get_result(conn)?;

    let role = schema::roles::table
        .find(user.role_id)
        .select(RoleRecord::as_select())
        .first(conn)?;
    Ok((user, role))
}

pub fn assign_role(conn: &mut PgConnection, user_id: i64, role: Role) -> QueryResult<UserWithRole> {
    let record = find_or_create_role(conn, role)?;
    let user = diesel::update(schema::users::table.find(user_id))
        .set((schema::users::role_id.eq(record.id), schema::users::updated_at.eq(Utc::now())))
        .returning(User::as_returning())
        .get_result(conn)?;
    Ok((user, record))
}

/// Returns whether a row was removed. Owned rows go with it via cascade.
pub fn delete_user(conn: &mut PgConnection, user_id: i64) -> QueryResult<bool> {
    let removed = diesel::delete(schema::users::table.find(user_id)).execute(conn)?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserWithRole {
        let now = Utc::now();
        (
            User {
                id: 9,
                username: "jdoe".into(),
                email: "jdoe@example.com".into(),
                password_hash: "$argon2id$v=19$secret".into(),
                full_name: Some("Jane Doe".into()),
                role_id: 2,
                created_at: now,
                updated_at: now,
            },
            RoleRecord {
                id: 2,
                name: "ROLE_INSTRUCTOR".into(),
            },
        )
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let json = serde_json::to_value(UserResponse::from(sample())).expect("json");

        assert_eq!(json["id"], 9);
        assert_eq!(json["fullName"], "Jane Doe");
        assert_eq!(json["role"], "ROLE_INSTRUCTOR");
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_role_of_record() {
        let (_, record) = sample();
        assert_eq!(role_of(&record), Role::Instructor);
        assert_eq!(
            role_of(&RoleRecord {
                id: 99,
                name: "ROLE_LEGACY".into()
            }),
            Role::Student
        );
    }
}
