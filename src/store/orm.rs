use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    db::{DbPool, OrmConn, create_orm_conn},
    entity::{
        AuditLogs, Categories, OrderLines, Orders, Products,
        audit_logs::ActiveModel as AuditActive,
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Model as CategoryModel},
        order_lines::{ActiveModel as OrderLineActive, Column as LineCol, Model as OrderLineModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{
        Category, NewOrder, NewOrderLine, NewProduct, Order, OrderFilter, OrderLine, OrderStatus,
        Page, Product, ProductChanges, ProductFilter, ProductSort, SortDirection,
    },
    store::{AuditEntry, AuditLog, CatalogStore, OrderStore},
};

/// PostgreSQL-backed store. Every read and write goes through SeaORM on a
/// connection that shares the sqlx pool.
#[derive(Clone)]
pub struct OrmStore {
    pool: DbPool,
    orm: OrmConn,
}

impl OrmStore {
    pub fn new(pool: DbPool) -> Self {
        let orm = create_orm_conn(&pool);
        Self { pool, orm }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn orm(&self) -> &OrmConn {
        &self.orm
    }
}

#[async_trait]
impl CatalogStore for OrmStore {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = Products::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(product_from_entity);
        Ok(product)
    }

    async fn get_products(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let products = Products::find()
            .filter(ProdCol::Id.is_in(ids.to_vec()))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        Ok(products)
    }

    async fn query_products(&self, filter: &ProductFilter) -> AppResult<Page<Product>> {
        let mut condition = Condition::all();

        if let Some(category_id) = filter.category_id {
            condition = condition.add(ProdCol::CategoryId.eq(category_id));
        }
        if let Some(min_price) = filter.min_price {
            condition = condition.add(ProdCol::Price.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            condition = condition.add(ProdCol::Price.lte(max_price));
        }
        if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            condition = condition.add(
                Condition::any()
                    .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                    .add(Expr::col(ProdCol::Detail).ilike(pattern)),
            );
        }

        let sort_col = match filter.sort_by {
            ProductSort::CreatedAt => ProdCol::CreatedAt,
            ProductSort::Price => ProdCol::Price,
            ProductSort::Name => ProdCol::Name,
        };

        let mut finder = Products::find().filter(condition);
        finder = match filter.direction {
            SortDirection::Asc => finder.order_by_asc(sort_col),
            SortDirection::Desc => finder.order_by_desc(sort_col),
        };

        let total = finder.clone().count(&self.orm).await? as i64;

        let items = finder
            .limit(filter.page.per_page as u64)
            .offset(filter.page.offset() as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();

        Ok(Page { items, total })
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        let category = Categories::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(category_from_entity);
        Ok(category)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = Categories::find()
            .order_by_asc(CategoryCol::Name)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(category_from_entity)
            .collect();
        Ok(categories)
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let active = ProductActive {
            id: Set(product.id),
            name: Set(product.name),
            price: Set(product.price),
            image: Set(product.image),
            detail: Set(product.detail),
            category_id: Set(product.category_id),
            created_at: NotSet,
        };
        let product = active
            .insert(&self.orm)
            .await
            .map_err(conflict_on_duplicate("product"))?;
        Ok(product_from_entity(product))
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        let existing = Products::find_by_id(id).one(&self.orm).await?;
        let existing = match existing {
            Some(p) => p,
            None => return Ok(None),
        };

        let mut active: ProductActive = existing.into();
        active.name = Set(changes.name);
        active.price = Set(changes.price);
        active.detail = Set(changes.detail);
        active.category_id = Set(changes.category_id);
        if let Some(image) = changes.image {
            active.image = Set(image);
        }

        let product = active
            .update(&self.orm)
            .await
            .map_err(conflict_on_duplicate("product"))?;
        Ok(Some(product_from_entity(product)))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.orm).await?;
        Ok(result.rows_affected > 0)
    }

    async fn insert_category(&self, id: Uuid, name: String) -> AppResult<Category> {
        let active = CategoryActive {
            id: Set(id),
            name: Set(name),
            created_at: NotSet,
        };
        let category = active
            .insert(&self.orm)
            .await
            .map_err(conflict_on_duplicate("category"))?;
        Ok(category_from_entity(category))
    }

    async fn update_category(&self, id: Uuid, name: String) -> AppResult<Option<Category>> {
        let existing = Categories::find_by_id(id).one(&self.orm).await?;
        let existing = match existing {
            Some(c) => c,
            None => return Ok(None),
        };

        let mut active: CategoryActive = existing.into();
        active.name = Set(name);
        let category = active
            .update(&self.orm)
            .await
            .map_err(conflict_on_duplicate("category"))?;
        Ok(Some(category_from_entity(category)))
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        let txn = self.orm.begin().await?;

        Products::update_many()
            .col_expr(ProdCol::CategoryId, Expr::value(Option::<Uuid>::None))
            .filter(ProdCol::CategoryId.eq(id))
            .exec(&txn)
            .await?;

        let result = Categories::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl OrderStore for OrmStore {
    async fn create_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> AppResult<(Order, Vec<OrderLine>)> {
        if lines.is_empty() {
            return Err(AppError::Validation("an order needs at least one line".into()));
        }

        // Dropping the transaction before commit (error or timeout) rolls it back.
        let txn = self.orm.begin().await?;

        let order_id = order.id;
        let order = OrderActive {
            id: Set(order.id),
            customer_name: Set(order.customer.name),
            customer_address: Set(order.customer.address),
            customer_email: Set(order.customer.email),
            customer_phone: Set(order.customer.phone),
            status: Set(order.status.as_str().to_string()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict(format!("order {order_id} already exists"))
            }
            _ => AppError::OrmError(err),
        })?;

        let line_models: Vec<OrderLineModel> = lines
            .into_iter()
            .map(|line| OrderLineModel {
                id: line.id,
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                created_at: order.created_at,
            })
            .collect();

        let actives: Vec<OrderLineActive> = line_models
            .iter()
            .map(|line| OrderLineActive {
                id: Set(line.id),
                order_id: Set(line.order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                created_at: Set(line.created_at),
            })
            .collect();

        // One multi-row insert inside the same transaction as the order.
        OrderLines::insert_many(actives).exec(&txn).await?;

        txn.commit().await?;

        let order = order_from_entity(order)?;
        let lines = line_models.into_iter().map(order_line_from_entity).collect();
        Ok((order, lines))
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        Orders::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<Page<Order>> {
        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }

        let mut finder = Orders::find().filter(condition);
        finder = match filter.direction {
            SortDirection::Asc => finder.order_by_asc(OrderCol::CreatedAt),
            SortDirection::Desc => finder.order_by_desc(OrderCol::CreatedAt),
        };

        let total = finder.clone().count(&self.orm).await? as i64;

        let items = finder
            .limit(filter.page.per_page as u64)
            .offset(filter.page.offset() as u64)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page { items, total })
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> AppResult<Option<Order>> {
        let result = Orders::update_many()
            .col_expr(OrderCol::Status, Expr::value(next.as_str()))
            .col_expr(OrderCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(OrderCol::Id.eq(id))
            .filter(OrderCol::Status.eq(expected.as_str()))
            .exec(&self.orm)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_order(id).await
    }

    async fn list_order_lines(&self, order_id: Option<Uuid>) -> AppResult<Vec<OrderLine>> {
        let mut finder = OrderLines::find();
        if let Some(order_id) = order_id {
            finder = finder.filter(LineCol::OrderId.eq(order_id));
        }
        let lines = finder
            .order_by_asc(LineCol::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_line_from_entity)
            .collect();
        Ok(lines)
    }
}

#[async_trait]
impl AuditLog for OrmStore {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        let active = AuditActive {
            id: Set(Uuid::new_v4()),
            action: Set(entry.action),
            resource: Set(entry.resource),
            metadata: Set(entry.metadata),
            created_at: NotSet,
        };
        AuditLogs::insert(active).exec(&self.orm).await?;
        Ok(())
    }
}

fn conflict_on_duplicate(what: &'static str) -> impl Fn(DbErr) -> AppError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} with this name already exists"))
        }
        _ => AppError::OrmError(err),
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        image: model.image,
        detail: model.detail,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = model.status.parse::<OrderStatus>().map_err(|_| {
        AppError::Internal(anyhow!(
            "order {} has unknown status '{}'",
            model.id,
            model.status
        ))
    })?;
    Ok(Order {
        id: model.id,
        customer_name: model.customer_name,
        customer_address: model.customer_address,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_line_from_entity(model: OrderLineModel) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
