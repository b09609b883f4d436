//! Book category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub category: String,
    pub sub_category: String,
}

/// Insert category request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Subcategory is required"))]
    pub sub_category: String,
}

impl CreateCategory {
    pub fn normalized(self) -> Self {
        CreateCategory {
            category: self.category.trim().to_lowercase(),
            sub_category: self.sub_category.trim().to_lowercase(),
        }
    }
}

/// One node of the category tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

/// Group flat category rows into `category -> [subcategory]` nodes,
/// keeping the order in which each category first appears.
pub fn group_categories(categories: &[Category]) -> Vec<CategoryNode> {
    let mut groups: Vec<CategoryNode> = Vec::new();
    for row in categories {
        let leaf = CategoryNode {
            name: row.sub_category.clone(),
            children: Vec::new(),
        };
        match groups.iter_mut().find(|g| g.name == row.category) {
            Some(group) => group.children.push(leaf),
            None => groups.push(CategoryNode {
                name: row.category.clone(),
                children: vec![leaf],
            }),
        }
    }
    groups
}
