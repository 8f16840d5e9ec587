pub mod builtin;
pub mod descriptor;
pub mod file;

use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::{CapdeckError, CapdeckResult};

pub use descriptor::{Action, CapabilityDescriptor, Payload, Target};

/// A named, ordered group of descriptors. Order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub descriptors: Vec<CapabilityDescriptor>,
}

/// Ordered categories of descriptors, indexed by id.
///
/// Read-only after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CapabilityCatalog {
    categories: Vec<Category>,
    /// id -> (category index, descriptor index)
    index: HashMap<String, (usize, usize)>,
}

impl CapabilityCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The catalog the application ships with.
    pub fn builtin() -> Self {
        builtin::catalog()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&CapabilityDescriptor> {
        let &(c, d) = self.index.get(id)?;
        Some(&self.categories[c].descriptors[d])
    }

    /// Like `get`, for ids that come from outside the program.
    pub fn require(&self, id: &str) -> CapdeckResult<&CapabilityDescriptor> {
        self.get(id)
            .ok_or_else(|| CapdeckError::UnknownCapability(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All descriptors in display order.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.categories.iter().flat_map(|c| c.descriptors.iter())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Index without validation; callers guarantee unique ids.
    fn assemble(categories: Vec<Category>) -> Self {
        let mut index = HashMap::new();
        for (c, category) in categories.iter().enumerate() {
            for (d, descriptor) in category.descriptors.iter().enumerate() {
                index.insert(descriptor.id.clone(), (c, d));
            }
        }
        Self { categories, index }
    }
}

/// Unknown ids are a programmer error: the catalog is static.
impl std::ops::Index<&str> for CapabilityCatalog {
    type Output = CapabilityDescriptor;

    fn index(&self, id: &str) -> &Self::Output {
        match self.get(id) {
            Some(descriptor) => descriptor,
            None => panic!("capability '{}' is not in the catalog", id),
        }
    }
}

/// Assembles a catalog category by category, validating on `build`.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    categories: Vec<Category>,
}

impl CatalogBuilder {
    /// Start a new category; following `item` calls land in it.
    pub fn category(mut self, name: impl Into<String>) -> Self {
        self.categories.push(Category {
            name: name.into(),
            descriptors: Vec::new(),
        });
        self
    }

    pub fn item(mut self, id: impl Into<String>, label: impl Into<String>, action: Action) -> Self {
        if self.categories.is_empty() {
            self = self.category("");
        }
        if let Some(category) = self.categories.last_mut() {
            let descriptor = CapabilityDescriptor::new(id, label, category.name.clone(), action);
            category.descriptors.push(descriptor);
        }
        self
    }

    /// Append a fully formed descriptor to the category it names.
    pub fn descriptor(mut self, descriptor: CapabilityDescriptor) -> Self {
        match self
            .categories
            .iter_mut()
            .find(|c| c.name == descriptor.category)
        {
            Some(category) => category.descriptors.push(descriptor),
            None => self.categories.push(Category {
                name: descriptor.category.clone(),
                descriptors: vec![descriptor],
            }),
        }
        self
    }

    pub fn build(self) -> CapdeckResult<CapabilityCatalog> {
        let problems = validate(&self.categories);
        if !problems.is_empty() {
            return Err(CapdeckError::InvalidCatalog(problems.join("; ")));
        }
        Ok(CapabilityCatalog::assemble(self.categories))
    }

    /// Build a catalog compiled into the binary.
    ///
    /// # Panics
    /// If the catalog is malformed. A shipped catalog that does not validate
    /// must stop the process at startup rather than shadow entries.
    pub(crate) fn build_static(self) -> CapabilityCatalog {
        let problems = validate(&self.categories);
        if !problems.is_empty() {
            panic!("static catalog failed validation: {}", problems.join("; "));
        }
        CapabilityCatalog::assemble(self.categories)
    }
}

fn validate(categories: &[Category]) -> Vec<String> {
    let mut problems = Vec::new();
    let mut names = HashSet::new();
    let mut ids = HashSet::new();

    for category in categories {
        if category.name.trim().is_empty() {
            problems.push("category with empty name".to_string());
        } else if !names.insert(category.name.as_str()) {
            problems.push(format!("duplicate category '{}'", category.name));
        }

        for descriptor in &category.descriptors {
            let id = descriptor.id.as_str();
            if id.trim().is_empty() {
                problems.push(format!("descriptor with empty id in '{}'", category.name));
                continue;
            }
            if !ids.insert(id) {
                problems.push(format!("duplicate id '{}'", id));
            }
            if descriptor.label.trim().is_empty() {
                problems.push(format!("'{}' has an empty label", id));
            }
            if descriptor.category != category.name {
                problems.push(format!(
                    "'{}' names category '{}' but is listed under '{}'",
                    id, descriptor.category, category.name
                ));
            }
            if descriptor.action.target().action.trim().is_empty() {
                problems.push(format!("'{}' has an empty target action", id));
            }
        }
    }

    problems
}
