use crate::common::part_letters;

/// State that lives for one builder run: the sequence used to name developable areas.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    sequence: usize,
}

impl RunContext {
    pub fn new() -> Self { Self::default() }

    /// Reserve the next area number (1-based).
    pub fn next_sequence(&mut self) -> usize {
        self.sequence += 1;
        self.sequence
    }

    /// Number of areas named so far.
    #[inline] pub fn sequence(&self) -> usize { self.sequence }
}

/// Display name of a developable area part, e.g. `Developable Area 2` or `Developable Area 2B`.
pub fn area_name(sequence: usize, part: Option<usize>) -> String {
    match part {
        Some(index) => format!("Developable Area {sequence}{}", part_letters(index)),
        None => format!("Developable Area {sequence}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_per_context() {
        let mut first = RunContext::new();
        assert_eq!(first.next_sequence(), 1);
        assert_eq!(first.next_sequence(), 2);

        let mut second = RunContext::new();
        assert_eq!(second.next_sequence(), 1);
    }

    #[test]
    fn names_include_part_letters() {
        assert_eq!(area_name(1, None), "Developable Area 1");
        assert_eq!(area_name(2, Some(0)), "Developable Area 2A");
        assert_eq!(area_name(3, Some(27)), "Developable Area 3AB");
    }
}
