use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type ProductId = u64;

/// Image reference stored when a product is submitted without one.
pub const PLACEHOLDER_IMG: &str = "sin-imagen.png";

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub price: f64,
    pub img: String,
    pub stock: u32,
}

impl Product {
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            code: draft.code,
            price: draft.price,
            img: draft.img,
            stock: draft.stock,
        }
    }

    /// Replaces every field except `id` with the draft's values.
    pub fn apply(&mut self, draft: ProductDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.code = draft.code;
        self.price = draft.price;
        self.img = draft.img;
        self.stock = draft.stock;
    }
}

/// Product fields as they arrive from a client, before validation.
///
/// Any `id` the client sends is ignored; ids are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: Option<f64>,
    pub img: Option<String>,
    pub stock: Option<i64>,
}

impl ProductFields {
    #[cfg(test)]
    pub fn new(title: impl Into<String>, price: f64, stock: i64) -> Self {
        Self {
            title: Some(title.into()),
            price: Some(price),
            stock: Some(stock),
            ..Self::default()
        }
    }

    /// Checks the required fields and normalizes the optional ones.
    ///
    /// # Errors
    /// - `title` missing or blank
    /// - `price` missing, not finite, or negative
    /// - `stock` missing, negative, or larger than `u32::MAX`
    pub fn validate(self) -> Result<ProductDraft, ValidationError> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            Some(_) => return Err(ValidationError::invalid("title", "must not be empty")),
            None => return Err(ValidationError::missing("title")),
        };

        let price = self.price.ok_or_else(|| ValidationError::missing("price"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::invalid(
                "price",
                format!("must be a non-negative number, got {price}"),
            ));
        }

        let stock = self.stock.ok_or_else(|| ValidationError::missing("stock"))?;
        let stock = u32::try_from(stock).map_err(|_| {
            ValidationError::invalid("stock", format!("must be between 0 and {}, got {stock}", u32::MAX))
        })?;

        let img = self
            .img
            .filter(|img| !img.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_IMG.to_string());

        Ok(ProductDraft {
            title,
            description: self.description,
            code: self.code,
            price,
            img,
            stock,
        })
    }
}

/// Validated product fields, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub price: f64,
    pub img: String,
    pub stock: u32,
}
