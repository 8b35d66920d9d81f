//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionError,
    TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{Category, Comment, CommentView, Post, PostDetail, User};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, LikeStatus, Page, Pagination, PostOrder, PostQuery,
    PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::user::{self, Entity as UserEntity};

fn query_err(e: DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

/// Map an insert/update failure, attributing unique violations to the
/// offending field via the constraint name in the message.
pub(crate) fn write_err(e: DbErr, fields: &[&'static str]) -> RepoError {
    let msg = e.to_string();
    let lowered = msg.to_lowercase();
    if lowered.contains("duplicate") || lowered.contains("unique") {
        for field in fields {
            if lowered.contains(field) {
                return RepoError::Unique(field);
            }
        }
        if let Some(first) = fields.first() {
            return RepoError::Unique(first);
        }
    }
    RepoError::Query(msg)
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, &["username", "email"]))?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }
}

/// PostgreSQL category repository.
pub struct PostgresCategoryRepository {
    db: DbConn,
}

impl PostgresCategoryRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let model = category::ActiveModel::from(category)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, &["slug", "name"]))?;
        Ok(model.into())
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let model = category::ActiveModel::from(category)
            .update(&self.db)
            .await
            .map_err(|e| write_err(e, &["slug", "name"]))?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // referencing posts fall back to NULL via the FK
        let result = CategoryEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }

    async fn name_exists(&self, name: &str) -> Result<bool, RepoError> {
        let count = CategoryEntity::find()
            .filter(category::Column::Name.eq(name))
            .count(&self.db)
            .await
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let count = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .count(&self.db)
            .await
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Correlated count used when ordering by popularity.
    fn likes_count_expr() -> sea_orm::sea_query::SimpleExpr {
        Expr::cust("(SELECT COUNT(*) FROM post_likes WHERE post_likes.post_id = posts.id)")
    }

    async fn enrich(
        &self,
        post_model: post::Model,
        category_model: Option<category::Model>,
        viewer: Option<Uuid>,
    ) -> Result<PostDetail, RepoError> {
        let author_name = UserEntity::find_by_id(post_model.author_id)
            .one(&self.db)
            .await
            .map_err(query_err)?
            .map(|u| u.username)
            .unwrap_or_else(|| "deleted".to_string());

        let likes_count = PostLikeEntity::find()
            .filter(post_like::Column::PostId.eq(post_model.id))
            .count(&self.db)
            .await
            .map_err(query_err)?;

        let liked_by_viewer = match viewer {
            Some(user_id) => PostLikeEntity::find_by_id((post_model.id, user_id))
                .one(&self.db)
                .await
                .map_err(query_err)?
                .is_some(),
            None => false,
        };

        let comments_count = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_model.id))
            .filter(comment::Column::Approved.eq(true))
            .count(&self.db)
            .await
            .map_err(query_err)?;

        Ok(PostDetail {
            post: post_model.into(),
            author_name,
            category: category_model.map(Into::into),
            likes_count,
            liked_by_viewer,
            comments_count,
        })
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, &["slug"]))?;
        Ok(model.into())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .update(&self.db)
            .await
            .map_err(|e| write_err(e, &["slug"]))?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // comments and like rows cascade via the FKs
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_detail_by_slug(
        &self,
        slug: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<PostDetail>, RepoError> {
        let found = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .find_also_related(CategoryEntity)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        match found {
            Some((post_model, category_model)) => {
                let detail = self.enrich(post_model, category_model, viewer).await?;
                Ok(Some(detail))
            }
            None => Ok(None),
        }
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let count = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .count(&self.db)
            .await
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn list(
        &self,
        query: &PostQuery,
        viewer: Option<Uuid>,
    ) -> Result<Page<PostDetail>, RepoError> {
        let mut select = PostEntity::find()
            .join(JoinType::InnerJoin, post::Relation::User.def())
            .find_also_related(CategoryEntity);

        if let Some(category_id) = query.category_id {
            select = select.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Some(published) = query.published {
            select = select.filter(post::Column::Published.eq(published));
        }
        if let Some(term) = query.search.as_deref() {
            select = select.filter(
                Condition::any()
                    .add(post::Column::Title.contains(term))
                    .add(post::Column::Content.contains(term))
                    .add(user::Column::Username.contains(term))
                    .add(category::Column::Name.contains(term)),
            );
        }

        let total = select.clone().count(&self.db).await.map_err(query_err)?;

        let select = match query.order {
            PostOrder::CreatedAtDesc => select.order_by_desc(post::Column::CreatedAt),
            PostOrder::CreatedAtAsc => select.order_by_asc(post::Column::CreatedAt),
            PostOrder::UpdatedAtDesc => select.order_by_desc(post::Column::UpdatedAt),
            PostOrder::UpdatedAtAsc => select.order_by_asc(post::Column::UpdatedAt),
            PostOrder::LikesDesc => select.order_by_desc(Self::likes_count_expr()),
            PostOrder::LikesAsc => select.order_by_asc(Self::likes_count_expr()),
        };

        let rows = select
            .offset(query.page.offset)
            .limit(query.page.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        let mut items = Vec::with_capacity(rows.len());
        for (post_model, category_model) in rows {
            items.push(self.enrich(post_model, category_model, viewer).await?);
        }

        Ok(Page { items, total })
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus, RepoError> {
        // flip and count under one transaction so the returned count
        // reflects this caller's committed mutation
        let result = self
            .db
            .transaction::<_, LikeStatus, DbErr>(move |txn| {
                Box::pin(async move {
                    let existing = PostLikeEntity::find_by_id((post_id, user_id))
                        .one(txn)
                        .await?;

                    let liked = match existing {
                        Some(row) => {
                            row.delete(txn).await?;
                            false
                        }
                        None => {
                            if PostEntity::find_by_id(post_id).one(txn).await?.is_none() {
                                return Err(DbErr::RecordNotFound("post".to_string()));
                            }
                            post_like::ActiveModel {
                                post_id: Set(post_id),
                                user_id: Set(user_id),
                            }
                            .insert(txn)
                            .await?;
                            true
                        }
                    };

                    let likes_count = PostLikeEntity::find()
                        .filter(post_like::Column::PostId.eq(post_id))
                        .count(txn)
                        .await?;

                    Ok(LikeStatus { liked, likes_count })
                })
            })
            .await;

        match result {
            Ok(status) => Ok(status),
            Err(TransactionError::Connection(e)) => Err(RepoError::Connection(e.to_string())),
            Err(TransactionError::Transaction(DbErr::RecordNotFound(_))) => {
                Err(RepoError::NotFound)
            }
            Err(TransactionError::Transaction(e)) => Err(RepoError::Query(e.to_string())),
        }
    }

    async fn is_liked(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let row = PostLikeEntity::find_by_id((post_id, user_id))
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(row.is_some())
    }
}

/// PostgreSQL comment repository.
pub struct PostgresCommentRepository {
    db: DbConn,
}

impl PostgresCommentRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn insert(&self, new_comment: Comment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(new_comment)
            .insert(&self.db)
            .await
            .map_err(query_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = CommentEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;
        Ok(result.map(Into::into))
    }

    async fn list_approved(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Page<CommentView>, RepoError> {
        let base = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Approved.eq(true));

        let total = base.clone().count(&self.db).await.map_err(query_err)?;

        let rows = base
            .order_by_desc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .offset(page.offset)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        let items = rows
            .into_iter()
            .map(|(comment_model, author)| CommentView {
                comment: comment_model.into(),
                author_name: author.map(|u| u.username),
            })
            .collect();

        Ok(Page { items, total })
    }
}
