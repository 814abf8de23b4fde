use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::conflict_on_unique, error::AppError},
    middleware::tenancy::TenantScope,
    models::auth::{Role, User},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo login (usado apenas na autenticação, antes de existir escopo)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID, dentro do escopo
    pub async fn find_by_id(&self, scope: &TenantScope, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match user {
            Some(u) => {
                // Superadmin não pertence a loja nenhuma: só operadores sem filtro o enxergam.
                let visible = match u.tenant_id {
                    Some(tenant_id) => scope.permits(tenant_id),
                    None => scope.tenant_id().is_none(),
                };
                if visible {
                    Ok(Some(u))
                } else {
                    Err(AppError::AccessDenied("Usuário de outra loja.".into()))
                }
            }
            None => Ok(None),
        }
    }

    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(scope.tenant_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// O dono mais antigo da loja (alvo da impersonação).
    pub async fn find_owner_of_tenant(&self, tenant_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE tenant_id = $1 AND role = 'owner' ORDER BY id ASC LIMIT 1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn superadmin_exists(&self) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'superadmin')")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    // Cria um novo usuário no banco de dados (aceita pool ou transação)
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        password_hash: &str,
        role: Role,
        tenant_id: Option<i64>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role, tenant_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(tenant_id)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, format!("O usuário '{}' já existe.", username)))
    }

    /// Grava a linha inteira (username, hash e papel). Tenant não muda.
    pub async fn update_user(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, password_hash = $3, role = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("O usuário '{}' já existe.", user.username)))
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
