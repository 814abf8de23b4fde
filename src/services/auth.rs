// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, Principal, TenantSummary, User, UserSummary},
        tenancy::ClientConfig,
    },
};

/// Um token recém-emitido e o seu identificador (jti).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        jwt_secret: String,
        token_ttl: Duration,
    ) -> Self {
        Self { user_repo, tenant_repo, jwt_secret, token_ttl }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::invalid_credentials());
        }

        // Lojas suspensas continuam autenticando; a política fica fora do núcleo.
        let tenant = match user.tenant_id {
            Some(tenant_id) => self.tenant_repo
                .find_by_id(tenant_id)
                .await?
                .map(|t| TenantSummary { id: t.id, name: t.name, business_type: t.business_type }),
            None => None,
        };

        let issued = self.create_token(&user)?;
        tracing::info!(user_id = user.id, tenant_id = ?user.tenant_id, "login efetuado");

        Ok(AuthResponse {
            token: issued.token,
            user: UserSummary { id: user.id, username: user.username, role: user.role },
            tenant,
        })
    }

    /// Resolve o principal a partir do token. Função pura de (token, segredo):
    /// não consulta o banco.
    pub fn validate_token(&self, token: &str) -> Result<Principal, AppError> {
        resolve_principal(token, &self.jwt_secret)
    }

    /// Configuração do PDV para quem está logado.
    pub async fn client_config(&self, principal: &Principal) -> Result<ClientConfig, AppError> {
        match principal.tenant_id() {
            None => Ok(ClientConfig::for_operator()),
            Some(tenant_id) => {
                let tenant = self
                    .tenant_repo
                    .find_by_id(tenant_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Loja não encontrada.".into()))?;
                Ok(ClientConfig::for_tenant(&tenant))
            }
        }
    }

    pub fn create_token(&self, user: &User) -> Result<IssuedToken, AppError> {
        let principal = Principal::from_user(user)?;
        issue_token(&principal, &self.jwt_secret, self.token_ttl)
    }
}

pub fn issue_token(
    principal: &Principal,
    secret: &str,
    ttl: Duration,
) -> Result<IssuedToken, AppError> {
    let now = Utc::now();
    let expires_at = now + ttl;
    let jti = Uuid::new_v4();

    let claims = Claims {
        sub: principal.user_id(),
        username: principal.username().to_string(),
        tenant_id: principal.tenant_id(),
        role: principal.role(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: jti.to_string(),
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?;
    Ok(IssuedToken { token, jti })
}

/// Assinatura, expiração e a regra papel/tenant; qualquer falha vira `Unauthenticated`.
pub fn resolve_principal(token: &str, secret: &str) -> Result<Principal, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map_err(|_| AppError::invalid_token())?;

    let claims = token_data.claims;
    Principal::new(claims.sub, claims.username, claims.tenant_id, claims.role)
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    // Executa a verificação em um thread separado
    let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        // Hash corrompido no banco não autentica ninguém.
        .unwrap_or(false);

    Ok(is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    const SECRET: &str = "segredo-de-teste";

    fn owner() -> Principal {
        Principal::new(42, "dono", Some(7), Role::Owner).unwrap()
    }

    #[test]
    fn issued_token_resolves_to_the_same_principal() {
        let issued = issue_token(&owner(), SECRET, Duration::hours(24)).unwrap();
        let principal = resolve_principal(&issued.token, SECRET).unwrap();
        assert_eq!(principal, owner());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = issue_token(&owner(), SECRET, Duration::hours(1)).unwrap();
        let err = resolve_principal(&issued.token, "outro-segredo").unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = issue_token(&owner(), SECRET, Duration::hours(-2)).unwrap();
        assert!(matches!(
            resolve_principal(&issued.token, SECRET),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(resolve_principal("", SECRET).is_err());
        assert!(resolve_principal("nao.e.jwt", SECRET).is_err());
    }

    #[test]
    fn token_with_inconsistent_role_and_tenant_is_rejected() {
        // Forja claims de superadmin com tenant, assinadas com o segredo correto.
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: 1,
            username: "root".into(),
            tenant_id: Some(3),
            role: Role::Superadmin,
            exp: now + 3600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token =
            encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_ref())).unwrap();

        assert!(matches!(
            resolve_principal(&token, SECRET),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn each_token_gets_its_own_jti() {
        let a = issue_token(&owner(), SECRET, Duration::hours(1)).unwrap();
        let b = issue_token(&owner(), SECRET, Duration::hours(1)).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hashed = hash_password("s3nha-forte").await.unwrap();
        assert!(verify_password("s3nha-forte", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
        assert!(!verify_password("qualquer", "nao-e-bcrypt").await.unwrap());
    }
}
