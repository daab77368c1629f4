/// A value that remembers whether it changed since it was last applied.
pub struct ChangeCell<T> {
    value: T,
    has_changed: bool,
}

impl<T> ChangeCell<T>
where
    T: PartialEq,
{
    /// Starts out changed so the first [`apply_on_change`](Self::apply_on_change) runs.
    pub fn new(value: T) -> Self {
        Self {
            value,
            has_changed: true,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        if self.value != value {
            self.value = value;
            self.has_changed = true;
        }
    }

    pub fn apply_on_change<F>(&mut self, closure: F)
    where
        F: FnOnce(&T),
    {
        if self.has_changed {
            closure(&self.value);
            self.has_changed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_once_per_change() {
        let mut cell = ChangeCell::new(1);
        let mut applied = Vec::new();
        cell.apply_on_change(|value| applied.push(*value));
        cell.apply_on_change(|value| applied.push(*value));
        cell.set(1);
        cell.apply_on_change(|value| applied.push(*value));
        cell.set(2);
        cell.apply_on_change(|value| applied.push(*value));
        assert_eq!(applied, [1, 2]);
        assert_eq!(*cell.get(), 2);
    }
}
