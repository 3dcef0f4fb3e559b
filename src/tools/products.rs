//! Product MCP Tools
//!
//! Tools for managing products and their reference nutrients.

use serde::Serialize;

use crate::db::Database;
use crate::models::{Product, ProductCreate, ProductUpdate};

/// Response for add_product
#[derive(Debug, Serialize)]
pub struct AddProductResponse {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub calories: f64,
    /// Calories were computed from macros rather than taken from the label
    pub calories_derived: bool,
    pub created_at: String,
}

/// Summary of a product for search results
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub calories: f64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            quantity: product.reference.quantity,
            unit: product.unit.clone(),
            calories: product.reference.calories,
        }
    }
}

/// Response for search_products
#[derive(Debug, Serialize)]
pub struct SearchProductsResponse {
    pub items: Vec<ProductSummary>,
    pub total: usize,
}

/// Full product detail
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub calories: f64,
    pub user_created: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            brand: product.brand,
            quantity: product.reference.quantity,
            unit: product.unit,
            protein: product.reference.protein,
            fat: product.reference.fat,
            carbs: product.reference.carbs,
            calories: product.reference.calories,
            user_created: product.user_created,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Add a new product
pub fn add_product(db: &Database, data: ProductCreate) -> Result<AddProductResponse, String> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Product name cannot be empty".to_string());
    }
    if data.unit.trim().is_empty() {
        return Err("unit cannot be empty".to_string());
    }

    let calories_derived = data.calories.is_none();
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product = Product::create(&conn, &data)
        .map_err(|e| format!("Failed to create product: {}", e))?;

    tracing::info!(id = product.id, name = %product.name, "Product added");

    Ok(AddProductResponse {
        id: product.id,
        name: product.name,
        brand: product.brand,
        calories: product.reference.calories,
        calories_derived,
        created_at: product.created_at,
    })
}

/// Get a product by ID
pub fn get_product(db: &Database, id: i64) -> Result<Option<ProductDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product = Product::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get product: {}", e))?;

    Ok(product.map(ProductDetail::from))
}

/// Search products by name or brand
pub fn search_products(db: &Database, query: &str, limit: i64) -> Result<SearchProductsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let products = Product::search(&conn, query, limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let items: Vec<ProductSummary> = products.iter().map(ProductSummary::from).collect();
    let total = items.len();

    Ok(SearchProductsResponse { items, total })
}

/// Update a product. Macro edits on user-created products re-derive calories.
pub fn update_product(db: &Database, id: i64, data: ProductUpdate) -> Result<Option<ProductDetail>, String> {
    if let Some(name) = &data.name {
        if name.trim().is_empty() {
            return Err("Product name cannot be empty".to_string());
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product = Product::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update product: {}", e))?;

    Ok(product.map(ProductDetail::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    fn oats(calories: Option<f64>, user_created: bool) -> ProductCreate {
        ProductCreate {
            name: "Rolled oats".to_string(),
            brand: Some("Mill".to_string()),
            unit: "g".to_string(),
            quantity: 100.0,
            protein: 10.0,
            fat: 10.0,
            carbs: 50.0,
            calories,
            user_created,
        }
    }

    #[test]
    fn test_add_product_derives_missing_calories() {
        let db = setup();
        let added = add_product(&db, oats(None, true)).unwrap();
        assert!(added.calories_derived);
        assert_eq!(added.calories, 330.0);

        let labelled = add_product(&db, oats(Some(352.0), false)).unwrap();
        assert!(!labelled.calories_derived);
        assert_eq!(labelled.calories, 352.0);
    }

    #[test]
    fn test_add_product_rejects_empty_name() {
        let db = setup();
        let mut data = oats(None, true);
        data.name = "  ".to_string();
        assert!(add_product(&db, data).is_err());
    }

    #[test]
    fn test_search_get_update() {
        let db = setup();
        let added = add_product(&db, oats(None, true)).unwrap();

        let found = search_products(&db, "oat", 500).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].id, added.id);

        let updated = update_product(
            &db,
            added.id,
            ProductUpdate {
                protein: Some(20.0),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.calories, 370.0);

        assert!(get_product(&db, 999).unwrap().is_none());
        assert_eq!(get_product(&db, added.id).unwrap().unwrap().protein, 20.0);
    }
}
