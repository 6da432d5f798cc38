//! PostgreSQL credential store.
//!
//! Uses sqlx runtime queries; the schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use super::{CredentialStore, StoreError};
use crate::models::{Company, CompanyMember, CompanyRole, NewUser, User, UserCompany};

const USER_COLUMNS: &str =
    "id, email, name, selected_company_id, otp, otp_expires_at, token, created_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserCompanyRow {
    id: i32,
    name: String,
    owner_id: i32,
    created_at: DateTime<Utc>,
    role: String,
}

#[derive(FromRow)]
struct MemberRow {
    user_id: i32,
    email: String,
    name: String,
    role: String,
}

fn parse_role(role: &str) -> Result<CompanyRole, StoreError> {
    role.parse()
        .map_err(|e: String| StoreError::Storage(anyhow::anyhow!(e)))
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }

    // ==================== User Operations ====================

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE token = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (email, name, selected_company_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.selected_company_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_user_otp(
        &self,
        user_id: i32,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET otp = $1, otp_expires_at = $2 WHERE id = $3")
            .bind(otp)
            .bind(expires_at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn consume_user_otp(
        &self,
        user_id: i32,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp = NULL, otp_expires_at = NULL
            WHERE id = $1 AND otp = $2 AND otp_expires_at > $3
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_user_token(&self, user_id: i32, token: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_user_selected_company(
        &self,
        user_id: i32,
        company_id: Option<i32>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET selected_company_id = $1 WHERE id = $2")
            .bind(company_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_all_users_with_token(&self) -> Result<Vec<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE token IS NOT NULL", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    // ==================== Company Operations ====================

    async fn create_company(&self, owner_id: i32, name: &str) -> Result<Company, StoreError> {
        let mut tx = self.pool.begin().await?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (company_name, owner_id)
            VALUES ($1, $2)
            RETURNING id, company_name AS name, owner_id, created_at
            "#,
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO company_users (company_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(company.id)
            .bind(owner_id)
            .bind(CompanyRole::Admin.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET selected_company_id = $1 WHERE id = $2")
            .bind(company.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(company)
    }

    async fn get_company_by_id(&self, company_id: i32) -> Result<Option<Company>, StoreError> {
        Ok(sqlx::query_as::<_, Company>(
            "SELECT id, company_name AS name, owner_id, created_at FROM companies WHERE id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn is_user_company_owner(&self, user_id: i32) -> Result<bool, StoreError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM companies WHERE owner_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get_user_companies(&self, user_id: i32) -> Result<Vec<UserCompany>, StoreError> {
        let rows = sqlx::query_as::<_, UserCompanyRow>(
            r#"
            SELECT c.id, c.company_name AS name, c.owner_id, c.created_at, cu.role
            FROM companies c
            JOIN company_users cu ON cu.company_id = c.id
            WHERE cu.user_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UserCompany {
                    role: parse_role(&row.role)?,
                    company: Company {
                        id: row.id,
                        name: row.name,
                        owner_id: row.owner_id,
                        created_at: row.created_at,
                    },
                })
            })
            .collect()
    }

    // ==================== Membership Operations ====================

    async fn add_user_to_company(
        &self,
        company_id: i32,
        user_id: i32,
        role: CompanyRole,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO company_users (company_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(company_id)
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_user_member_of_company(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM company_users WHERE company_id = $1 AND user_id = $2)",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn get_company_user_role(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<Option<CompanyRole>, StoreError> {
        let role: Option<(String,)> = sqlx::query_as(
            "SELECT role FROM company_users WHERE company_id = $1 AND user_id = $2",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        role.map(|(role,)| parse_role(&role)).transpose()
    }

    async fn get_company_members(&self, company_id: i32) -> Result<Vec<CompanyMember>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT u.id AS user_id, u.email, u.name, cu.role
            FROM company_users cu
            JOIN users u ON u.id = cu.user_id
            WHERE cu.company_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CompanyMember {
                    role: parse_role(&row.role)?,
                    user_id: row.user_id,
                    email: row.email,
                    name: row.name,
                })
            })
            .collect()
    }

    async fn remove_company_member(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM company_users WHERE company_id = $1 AND user_id = $2")
            .bind(company_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET selected_company_id = NULL WHERE id = $1 AND selected_company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
