use serde::{Deserialize, Serialize};

/// A single module parameter value.
///
/// Parameters are positional and loosely typed, mirroring how modules read them: the
/// aggregator, for example, expects alternating method selectors and nested parameter lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum ModuleParam {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(ModuleParams),
}

impl From<&str> for ModuleParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i32> for ModuleParam {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Ordered, positional parameters for one pipeline module.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleParams(Vec<ModuleParam>);

impl ModuleParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, param: impl Into<ModuleParam>) {
        self.0.push(param.into());
    }

    #[must_use]
    pub fn with(mut self, param: impl Into<ModuleParam>) -> Self {
        self.push(param);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ModuleParam> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleParam> {
        self.0.iter()
    }

    /// Integer at `index`, if present and integral.
    #[must_use]
    pub fn int(&self, index: usize) -> Option<i64> {
        match self.get(index)? {
            ModuleParam::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Number at `index`; integers are widened.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn float(&self, index: usize) -> Option<f64> {
        match self.get(index)? {
            ModuleParam::Float(v) => Some(*v),
            ModuleParam::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn bool(&self, index: usize) -> Option<bool> {
        match self.get(index)? {
            ModuleParam::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromIterator<ModuleParam> for ModuleParams {
    fn from_iter<T: IntoIterator<Item = ModuleParam>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<ModuleParam>> for ModuleParams {
    fn from(params: Vec<ModuleParam>) -> Self {
        Self(params)
    }
}

impl<'a> IntoIterator for &'a ModuleParams {
    type Item = &'a ModuleParam;
    type IntoIter = std::slice::Iter<'a, ModuleParam>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let params = ModuleParams::new().with(3).with(0.5).with(true).with("lpc");
        assert_eq!(params.int(0), Some(3));
        assert_eq!(params.float(0), Some(3.0));
        assert_eq!(params.float(1), Some(0.5));
        assert_eq!(params.bool(2), Some(true));
        assert_eq!(params.int(3), None);
        assert_eq!(params.get(4), None);
    }

    #[test]
    fn test_nested_lists_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            params: ModuleParams,
        }
        let wrapper: Wrapper = toml::from_str("params = [301, [], 306, [10, 10]]").unwrap();
        let params = wrapper.params;
        assert_eq!(params.len(), 4);
        assert_eq!(params.int(0), Some(301));
        assert_eq!(params.get(1), Some(&ModuleParam::List(ModuleParams::new())));
        let ModuleParam::List(nested) = params.get(3).unwrap() else {
            panic!("expected nested list");
        };
        assert_eq!(nested.int(1), Some(10));
    }
}
