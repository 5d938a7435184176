//! 通用仓储集成测试
//!
//! 使用真实 PostgreSQL 验证语句生成、软删除、批量原子性和事务。
//!
//! ## 运行方式
//!
//! ```bash
//! TEST_DATABASE_URL=postgres://... \
//!   cargo test -p qms-repository --test repository_integration -- --ignored
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use qms_repository::{
    DbConnections, Entity, FieldDef, Repository, RepositoryError, SqlValue, fields,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

// ==================== 测试实体 ====================

#[derive(Debug, Clone, sqlx::FromRow)]
struct Widget {
    id: i64,
    code: String,
    label: Option<String>,
    weight: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Widget {
    fn new(code: &str, weight: i32) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: 0,
            code: code.to_string(),
            label: None,
            weight,
            created_at: epoch,
            updated_at: epoch,
            deleted_at: None,
        }
    }
}

impl Entity for Widget {
    fn table_name() -> &'static str {
        "it_widgets"
    }

    fn fields() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            FieldDef::new("id"),
            FieldDef::new("code"),
            FieldDef::new("label"),
            FieldDef::new("weight"),
            FieldDef::new("created_at"),
            FieldDef::new("updated_at"),
            FieldDef::new("deleted_at"),
        ];
        FIELDS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.code.clone().into(),
            self.label.clone().into(),
            self.weight.into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.deleted_at.into(),
        ]
    }
}

// ==================== 辅助函数 ====================

fn database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// 连接数据库并确保测试表存在
async fn setup() -> Repository<Widget> {
    let pool = PgPool::connect(&database_url()).await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS it_widgets (
            id BIGSERIAL PRIMARY KEY,
            code VARCHAR(64) NOT NULL UNIQUE,
            label TEXT,
            weight INTEGER NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            deleted_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("创建测试表失败");

    Repository::new(DbConnections::single(pool))
}

/// 每个测试使用独立前缀，避免互相干扰
fn unique_code(tag: &str) -> String {
    format!("{tag}-{}", uuid::Uuid::new_v4().simple())
}

// ==================== 测试用例 ====================

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_save_round_trip_backfills_identity_and_timestamps() {
    let repo = setup().await;
    let mut widget = Widget::new(&unique_code("round"), 7);
    widget.label = Some("first".to_string());

    repo.save(&mut widget).await.unwrap();

    assert!(widget.id > 0);
    assert_eq!(widget.created_at, widget.updated_at);
    assert!(widget.created_at > DateTime::<Utc>::UNIX_EPOCH);

    let found = repo.find_by_id(widget.id).await.unwrap();
    assert_eq!(found.code, widget.code);
    assert_eq!(found.label.as_deref(), Some("first"));
    assert_eq!(found.weight, 7);
    assert_eq!(found.created_at, found.updated_at);
    assert!(found.deleted_at.is_none());
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_save_batch_is_atomic() {
    let repo = setup().await;
    let fresh = unique_code("batch");
    let duplicate = unique_code("batch-dup");

    let mut batch = vec![
        Widget::new(&fresh, 1),
        Widget::new(&duplicate, 2),
        Widget::new(&duplicate, 3),
    ];
    let err = repo.save_batch(&mut batch).await.unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueViolation { .. }));

    assert_eq!(repo.count(&fields! { "code" => fresh }).await.unwrap(), 0);
    assert_eq!(repo.count(&fields! { "code" => duplicate }).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_update_batch_is_atomic() {
    let repo = setup().await;
    let mut batch = vec![
        Widget::new(&unique_code("ub"), 1),
        Widget::new(&unique_code("ub"), 2),
    ];
    repo.save_batch(&mut batch).await.unwrap();

    let mut first = batch[0].clone();
    first.weight = 100;
    let mut missing = batch[1].clone();
    missing.id = i64::MAX;

    let err = repo.update_batch(&[first, missing]).await.unwrap_err();
    assert!(err.is_not_found());

    let unchanged = repo.find_by_id(batch[0].id).await.unwrap();
    assert_eq!(unchanged.weight, 1);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_update_and_partial_update() {
    let repo = setup().await;
    let mut widget = Widget::new(&unique_code("upd"), 1);
    repo.save(&mut widget).await.unwrap();
    let created_at = widget.created_at;

    widget.weight = 2;
    widget.created_at = DateTime::<Utc>::UNIX_EPOCH;
    repo.update(widget.id, &widget).await.unwrap();

    let found = repo.find_by_id(widget.id).await.unwrap();
    assert_eq!(found.weight, 2);
    assert_eq!(found.created_at, created_at);
    assert!(found.updated_at >= created_at);

    repo.update_entity(widget.id, &fields! { "label" => "renamed" })
        .await
        .unwrap();
    let found = repo.find_by_id(widget.id).await.unwrap();
    assert_eq!(found.label.as_deref(), Some("renamed"));
    assert_eq!(found.weight, 2);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_empty_update_performs_no_write() {
    let repo = setup().await;
    let mut widget = Widget::new(&unique_code("empty"), 1);
    repo.save(&mut widget).await.unwrap();

    let err = repo.update_entity(widget.id, &fields! {}).await.unwrap_err();
    assert!(matches!(err, RepositoryError::EmptyUpdate { .. }));

    let found = repo.find_by_id(widget.id).await.unwrap();
    assert_eq!(found.updated_at, widget.updated_at);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_missing_identity_is_not_found() {
    let repo = setup().await;
    let missing = 999_999_999;
    let widget = Widget::new(&unique_code("nf"), 1);

    assert!(repo.update(missing, &widget).await.unwrap_err().is_not_found());
    assert!(repo.delete(missing).await.unwrap_err().is_not_found());
    assert!(repo.hard_delete(missing).await.unwrap_err().is_not_found());
    assert!(repo.find_by_id(missing).await.unwrap_err().is_not_found());
    assert!(
        repo.update_entity(missing, &fields! { "weight" => 3_i32 })
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_soft_delete_hides_row_from_reads() {
    let repo = setup().await;
    let code = unique_code("soft");
    let mut widget = Widget::new(&code, 1);
    repo.save(&mut widget).await.unwrap();

    repo.delete(widget.id).await.unwrap();

    assert!(repo.find_by_id(widget.id).await.unwrap_err().is_not_found());
    assert!(!repo.exists(widget.id).await.unwrap());
    assert_eq!(repo.count(&fields! { "code" => code.as_str() }).await.unwrap(), 0);
    assert!(repo.find(&fields! { "code" => code.as_str() }, 0, 0).await.unwrap().is_empty());

    // 已软删除的行不能再次软删除或更新
    assert!(repo.delete(widget.id).await.unwrap_err().is_not_found());
    assert!(repo.update(widget.id, &widget).await.unwrap_err().is_not_found());

    // 物理删除不受软删除过滤影响
    repo.hard_delete(widget.id).await.unwrap();
    assert!(!repo.exists(widget.id).await.unwrap());
    assert!(repo.hard_delete(widget.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_upsert_inserts_then_updates() {
    let repo = setup().await;
    let mut widget = Widget::new(&unique_code("ups"), 1);

    repo.upsert(&mut widget).await.unwrap();
    assert!(widget.id > 0);
    let id = widget.id;

    widget.weight = 9;
    repo.upsert(&mut widget).await.unwrap();
    assert_eq!(widget.id, id);
    assert_eq!(repo.find_by_id(id).await.unwrap().weight, 9);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_find_with_limit_offset_and_null_condition() {
    let repo = setup().await;
    let mut batch: Vec<Widget> = (0..3)
        .map(|i| Widget::new(&unique_code("page"), 4242 + i))
        .collect();
    batch[2].label = Some("labelled".to_string());
    repo.save_batch(&mut batch).await.unwrap();

    let first = repo.find_one(&fields! { "code" => batch[0].code.as_str() }).await.unwrap();
    assert_eq!(first.id, batch[0].id);

    let page = repo
        .find(&fields! { "label" => None::<String> }, 1, 0)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);

    let unlabelled = repo
        .find(&fields! { "code" => batch[0].code.as_str(), "label" => None::<String> }, 0, 0)
        .await
        .unwrap();
    assert_eq!(unlabelled.len(), 1);

    let labelled = repo
        .find(&fields! { "code" => batch[2].code.as_str(), "label" => None::<String> }, 0, 0)
        .await
        .unwrap();
    assert!(labelled.is_empty());

    assert!(
        repo.find_one(&fields! { "code" => "no-such-widget" })
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_execute_in_transaction_commits_and_rolls_back() {
    let repo = setup().await;

    let committed_code = unique_code("tx-ok");
    let inner = repo.clone();
    let code = committed_code.clone();
    let saved = repo
        .execute_in_transaction(move |conn| {
            Box::pin(async move {
                let mut widget = Widget::new(&code, 1);
                inner.save_in(&mut *conn, &mut widget).await?;
                Ok::<_, RepositoryError>(widget)
            })
        })
        .await
        .unwrap();
    assert!(repo.exists(saved.id).await.unwrap());

    let rolled_back_code = unique_code("tx-fail");
    let inner = repo.clone();
    let code = rolled_back_code.clone();
    let result: Result<(), RepositoryError> = repo
        .execute_in_transaction(move |conn| {
            Box::pin(async move {
                let mut widget = Widget::new(&code, 1);
                inner.save_in(&mut *conn, &mut widget).await?;
                inner.hard_delete_in(&mut *conn, i64::MAX).await
            })
        })
        .await;

    assert!(result.unwrap_err().is_not_found());
    assert_eq!(
        repo.count(&fields! { "code" => rolled_back_code }).await.unwrap(),
        0
    );
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_cancelled_transaction_rolls_back() {
    setup().await;

    // 单连接池：被取消的事务回滚之后，连接才能再次被使用
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url())
        .await
        .unwrap();
    let repo = Repository::<Widget>::new(DbConnections::single(pool));
    let code = unique_code("tx-cancel");

    let inner = repo.clone();
    let pending_code = code.clone();
    let cancelled = tokio::time::timeout(
        Duration::from_millis(300),
        repo.execute_in_transaction(move |conn| {
            Box::pin(async move {
                let mut widget = Widget::new(&pending_code, 1);
                inner.save_in(&mut *conn, &mut widget).await?;
                std::future::pending::<()>().await;
                Ok::<_, RepositoryError>(())
            })
        }),
    )
    .await;
    assert!(cancelled.is_err());

    let mut widget = Widget::new(&code, 2);
    repo.save(&mut widget).await.unwrap();
    assert_eq!(repo.count(&fields! { "code" => code }).await.unwrap(), 1);
}
