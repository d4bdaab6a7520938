// ==========================================
// 化工设备参数可视化 - 用户与令牌仓储
// ==========================================
// 对齐: app_user / auth_token 表
// 红线: Repository 不做口令校验，只做数据映射
// ==========================================

use crate::domain::UserAccount;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 用户
    // ==========================================

    /// 新建用户（用户名重复时返回 UniqueConstraintViolation）
    pub fn insert_user(&self, user: &UserAccount) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO app_user (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按用户名查询
    pub fn find_user(&self, username: &str) -> RepositoryResult<Option<UserAccount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT username, email, password_hash, created_at FROM app_user WHERE username = ?1",
        )?;

        let result = stmt.query_row(params![username], map_user_row);
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 令牌
    // ==========================================

    pub fn insert_token(
        &self,
        token: &str,
        username: &str,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO auth_token (token, username, created_at) VALUES (?1, ?2, ?3)",
            params![token, username, created_at.format(TS_FORMAT).to_string()],
        )?;
        Ok(())
    }

    /// 令牌对应的用户名
    pub fn find_username_by_token(&self, token: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT username FROM auth_token WHERE token = ?1",
            params![token],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(username) => Ok(Some(username)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 吊销令牌，返回删除行数
    pub fn delete_token(&self, token: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM auth_token WHERE token = ?1", params![token])?;
        Ok(rows)
    }
}

fn map_user_row(row: &Row) -> rusqlite::Result<UserAccount> {
    let created_at: String = row.get(3)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(UserAccount {
        username: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at,
    })
}
