//! Product model
//!
//! A food product with reference nutrient values at its base quantity.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::NutrientVector;
use crate::db::{DbError, DbResult};
use crate::nutrition::{derive_calories, scale_nutrients, NutritionError};

/// A product with reference nutrients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub unit: String,
    /// Nutrients at the reference quantity (`reference.quantity`)
    pub reference: NutrientVector,
    /// Defined by the user rather than imported from a label or lookup
    pub user_created: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub brand: Option<String>,
    pub unit: String,
    pub quantity: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    /// Label calories. When absent, calories are derived from the macros.
    pub calories: Option<f64>,
    pub user_created: bool,
}

/// Data for updating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub calories: Option<f64>,
}

impl ProductUpdate {
    fn touches_macros(&self) -> bool {
        self.protein.is_some() || self.fat.is_some() || self.carbs.is_some()
    }
}

impl ProductCreate {
    /// Reference vector with calories taken from the label, or derived
    pub fn reference(&self) -> DbResult<NutrientVector> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(NutritionError::InvalidQuantity {
                field: "quantity",
                value: self.quantity,
            }
            .into());
        }
        let calories = match self.calories {
            Some(kcal) => kcal,
            None => derive_calories(self.protein, self.fat, self.carbs)?,
        };
        let reference = NutrientVector::new(self.protein, self.fat, self.carbs, calories, self.quantity);
        reference.validate()?;
        Ok(reference)
    }
}

impl Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            unit: row.get("unit")?,
            reference: NutrientVector {
                protein: row.get("protein")?,
                fat: row.get("fat")?,
                carbs: row.get("carbs")?,
                calories: row.get("calories")?,
                quantity: row.get("quantity")?,
            },
            user_created: row.get("user_created")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Nutrients for a portion of `quantity` in the product's unit
    pub fn portion(&self, quantity: f64) -> DbResult<NutrientVector> {
        Ok(scale_nutrients(&self.reference, quantity)?)
    }

    /// Create a new product
    pub fn create(conn: &Connection, data: &ProductCreate) -> DbResult<Self> {
        let reference = data.reference()?;

        conn.execute(
            r#"
            INSERT INTO products (name, brand, unit, quantity, protein, fat, carbs, calories, user_created)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                data.name,
                data.brand,
                data.unit,
                reference.quantity,
                reference.protein,
                reference.fat,
                reference.carbs,
                reference.calories,
                data.user_created,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("product {}", id)))
    }

    /// Get a product by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search products by name or brand
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM products
            WHERE name LIKE ?1 OR brand LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )?;

        let products = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Update a product.
    ///
    /// Editing macros of a user-created product re-derives its calories.
    /// Imported products keep their label calories unless calories are
    /// supplied explicitly.
    pub fn update(conn: &Connection, id: i64, data: &ProductUpdate) -> DbResult<Option<Self>> {
        let existing = match Self::get_by_id(conn, id)? {
            Some(p) => p,
            None => return Ok(None),
        };

        let mut reference = existing.reference;
        if let Some(protein) = data.protein {
            reference.protein = protein;
        }
        if let Some(fat) = data.fat {
            reference.fat = fat;
        }
        if let Some(carbs) = data.carbs {
            reference.carbs = carbs;
        }

        reference.calories = if existing.user_created && data.touches_macros() {
            derive_calories(reference.protein, reference.fat, reference.carbs)?
        } else {
            data.calories.unwrap_or(reference.calories)
        };
        reference.validate()?;

        let name = data.name.clone().unwrap_or(existing.name);
        let brand = data.brand.clone().or(existing.brand);

        conn.execute(
            r#"
            UPDATE products SET
                name = ?1, brand = ?2, protein = ?3, fat = ?4, carbs = ?5, calories = ?6,
                updated_at = datetime('now')
            WHERE id = ?7
            "#,
            params![
                name,
                brand,
                reference.protein,
                reference.fat,
                reference.carbs,
                reference.calories,
                id
            ],
        )?;

        Self::get_by_id(conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn label_product() -> ProductCreate {
        ProductCreate {
            name: "Granola".to_string(),
            brand: Some("Crunchy".to_string()),
            unit: "g".to_string(),
            quantity: 100.0,
            protein: 10.0,
            fat: 15.0,
            carbs: 60.0,
            calories: Some(437.0),
            user_created: false,
        }
    }

    #[test]
    fn test_create_keeps_label_calories() {
        let conn = conn();
        let product = Product::create(&conn, &label_product()).unwrap();
        // macros derive 415 kcal; the label value wins
        assert_eq!(product.reference.calories, 437.0);
        assert!(!product.user_created);
    }

    #[test]
    fn test_create_derives_missing_calories() {
        let conn = conn();
        let data = ProductCreate {
            calories: None,
            user_created: true,
            ..label_product()
        };
        let product = Product::create(&conn, &data).unwrap();
        assert_eq!(product.reference.calories, 415.0);
    }

    #[test]
    fn test_create_rejects_zero_quantity() {
        let conn = conn();
        let data = ProductCreate {
            quantity: 0.0,
            ..label_product()
        };
        assert!(matches!(
            Product::create(&conn, &data),
            Err(DbError::Nutrition(NutritionError::InvalidQuantity { .. }))
        ));
    }

    #[test]
    fn test_update_macros_on_user_product_rederives_calories() {
        let conn = conn();
        let data = ProductCreate {
            calories: None,
            user_created: true,
            ..label_product()
        };
        let product = Product::create(&conn, &data).unwrap();
        let update = ProductUpdate {
            protein: Some(20.0),
            calories: Some(999.0),
            ..Default::default()
        };
        let updated = Product::update(&conn, product.id, &update).unwrap().unwrap();
        assert_eq!(updated.reference.protein, 20.0);
        assert_eq!(updated.reference.calories, 455.0);
    }

    #[test]
    fn test_update_macros_on_label_product_keeps_calories() {
        let conn = conn();
        let product = Product::create(&conn, &label_product()).unwrap();
        let update = ProductUpdate {
            fat: Some(16.0),
            ..Default::default()
        };
        let updated = Product::update(&conn, product.id, &update).unwrap().unwrap();
        assert_eq!(updated.reference.fat, 16.0);
        assert_eq!(updated.reference.calories, 437.0);
    }

    #[test]
    fn test_portion_and_search() {
        let conn = conn();
        let product = Product::create(&conn, &label_product()).unwrap();
        let portion = product.portion(45.0).unwrap();
        assert_eq!(portion.protein, 4.5);
        assert_eq!(portion.calories, 197.0);
        assert_eq!(portion.quantity, 45.0);

        assert_eq!(Product::search(&conn, "gran", 10).unwrap().len(), 1);
        assert_eq!(Product::search(&conn, "crunchy", 10).unwrap().len(), 1);
        assert!(Product::search(&conn, "rice", 10).unwrap().is_empty());
        assert!(Product::update(&conn, 999, &ProductUpdate::default()).unwrap().is_none());
    }
}
