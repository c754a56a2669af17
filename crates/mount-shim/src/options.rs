//! The `nmount(2)` option list.
//!
//! An [`OptionList`] is an ordered vector of owned buffers that alternate between option names and
//! option values, which is exactly the shape `nmount(2)` takes as its `iovec` array. Every buffer
//! is duplicated from the caller's memory with fallible allocation, and released when the list is
//! dropped.
//!
//! The list has a sticky failure state. The first failed append is remembered, every append after
//! it is ignored, and [`OptionList::finalize`] reports it. Each append also returns the failure so
//! that encoders can stop early with `?`.

use crate::{scratch, TranslationError};
use std::{ffi::CStr, fmt, iter::FusedIterator, slice};

/// The value half of an option.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Value<'a> {
    /// No value at all. Used for flags, whose meaning is carried by the name.
    Absent,
    /// Text, without its terminator. It is stored NUL-terminated.
    Text(&'a [u8]),
    /// A binary blob, stored verbatim.
    Binary(&'a [u8]),
}

impl<'a> From<&'a CStr> for Value<'a> {
    fn from(text: &'a CStr) -> Self {
        Self::Text(text.to_bytes())
    }
}

impl<'a> From<Option<&'a CStr>> for Value<'a> {
    fn from(text: Option<&'a CStr>) -> Self {
        text.map(Self::from).unwrap_or(Self::Absent)
    }
}

type Segment = Option<Vec<u8>>;

#[derive(Debug, Default)]
pub struct OptionList {
    iov: Vec<Segment>,
    failure: Option<TranslationError>,
}

fn duplicate(bytes: &[u8], terminate: bool) -> Result<Vec<u8>, TranslationError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes.len() + usize::from(terminate))
        .map_err(|_| TranslationError::AllocationFailure)?;
    buf.extend_from_slice(bytes);
    if terminate {
        buf.push(0);
    }
    Ok(buf)
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of segments (names and values) in the list.
    pub fn len(&self) -> usize {
        self.iov.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iov.is_empty()
    }

    /// Number of segments the list can hold before it has to grow.
    pub fn capacity(&self) -> usize {
        self.iov.capacity()
    }

    pub fn failure(&self) -> Option<TranslationError> {
        self.failure
    }

    fn check(&self) -> Result<(), TranslationError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: TranslationError) -> TranslationError {
        *self.failure.get_or_insert(err)
    }

    fn reserve_pair(&mut self) -> Result<(), TranslationError> {
        let needed = self.iov.len() + 2;
        let capacity = self.iov.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let target = needed.max(capacity * 2);
        self.iov
            .try_reserve_exact(target - self.iov.len())
            .map_err(|_| TranslationError::AllocationFailure)
    }

    fn try_append(&mut self, name: &str, value: Value<'_>) -> Result<(), TranslationError> {
        if name.as_bytes().contains(&0) {
            return Err(TranslationError::ContractViolation);
        }
        self.reserve_pair()?;
        let name = duplicate(name.as_bytes(), true)?;
        let value = match value {
            Value::Absent => None,
            Value::Text(text) => Some(duplicate(text, true)?),
            Value::Binary(bytes) => Some(duplicate(bytes, false)?),
        };
        self.iov.push(Some(name));
        self.iov.push(value);
        Ok(())
    }

    /// Append one option. Either both the name and the value are appended, or neither is.
    pub fn append(&mut self, name: &str, value: Value<'_>) -> Result<(), TranslationError> {
        self.check()?;
        self.try_append(name, value).map_err(|err| self.fail(err))
    }

    /// Append an option whose value is `args` rendered as text. The rendering has to fit in
    /// [`scratch::SCRATCH_LEN`] bytes including its terminator.
    pub fn append_formatted(
        &mut self,
        name: &str,
        args: fmt::Arguments<'_>,
    ) -> Result<(), TranslationError> {
        self.check()?;
        let mut buf = [0; scratch::SCRATCH_LEN];
        match scratch::render(&mut buf, args) {
            Ok(text) => self.append(name, Value::Text(text)),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Append a boolean option. `name` is the negative form of the option, like `"noatime"`. When
    /// `active` is true, `name` itself is appended. Otherwise the positive form, `name` without its
    /// "no" prefix, is appended.
    pub fn append_flag(&mut self, name: &str, active: bool) -> Result<(), TranslationError> {
        self.check()?;
        let Some(positive) = name.strip_prefix("no").filter(|rest| !rest.is_empty()) else {
            return Err(self.fail(TranslationError::ContractViolation));
        };
        self.append(if active { name } else { positive }, Value::Absent)
    }

    /// The finished list, ready to be handed to `nmount(2)`, or the failure that stopped it.
    pub fn finalize(&self) -> Result<Options<'_>, TranslationError> {
        self.check()?;
        Ok(Options { iov: &self.iov })
    }

    /// Free every buffer and return to the empty state. Dropping the list does the same.
    pub fn release(&mut self) {
        self.iov = Vec::new();
        self.failure = None;
    }
}

/// A finalized, error-free option list. The number of segments is always even.
#[derive(Clone, Copy, Debug)]
pub struct Options<'a> {
    iov: &'a [Segment],
}

impl<'a> Options<'a> {
    /// Number of segments: twice the number of options.
    pub fn len(&self) -> usize {
        self.iov.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iov.is_empty()
    }

    /// The raw segments in `nmount(2)` order: name, value, name, value...
    pub fn segments(&self) -> impl ExactSizeIterator<Item = Option<&'a [u8]>> + 'a {
        self.iov.iter().map(Option::as_deref)
    }

    pub fn entries(&self) -> Entries<'a> {
        Entries(self.iov.chunks_exact(2))
    }

    /// The first option called `name`, if any.
    pub fn get(&self, name: &str) -> Option<Entry<'a>> {
        self.entries()
            .find(|entry| entry.name.to_bytes() == name.as_bytes())
    }
}

/// One name/value pair of a finalized list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Entry<'a> {
    pub name: &'a CStr,
    pub value: Option<&'a [u8]>,
}

impl<'a> Entry<'a> {
    /// The value as a C string, if it is one.
    pub fn text(&self) -> Option<&'a CStr> {
        self.value
            .and_then(|value| CStr::from_bytes_with_nul(value).ok())
    }
}

pub struct Entries<'a>(slice::ChunksExact<'a, Segment>);

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let [name, value] = self.0.next()? else {
            return None;
        };
        let name = name
            .as_deref()
            .and_then(|name| CStr::from_bytes_with_nul(name).ok())
            .unwrap_or_default();
        Some(Entry {
            name,
            value: value.as_deref(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_> {}

impl FusedIterator for Entries<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn names(options: Options<'_>) -> Vec<&str> {
        options
            .entries()
            .map(|entry| entry.name.to_str().unwrap())
            .collect()
    }

    #[test]
    fn new_list_is_empty_and_finalizes() {
        let list = OptionList::new();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 0);
        assert!(list.finalize().unwrap().is_empty());
    }

    #[test]
    fn text_values_are_terminated() {
        let mut list = OptionList::new();
        list.append("from", Value::from(c"/dev/cd0")).unwrap();
        let options = list.finalize().unwrap();
        let segments: Vec<_> = options.segments().collect();
        assert_eq!(
            segments,
            vec![Some(b"from\0".as_slice()), Some(b"/dev/cd0\0".as_slice())]
        );
        assert_eq!(options.get("from").unwrap().text(), Some(c"/dev/cd0"));
    }

    #[test]
    fn text_value_keeps_every_byte_before_terminator() {
        let mut list = OptionList::new();
        let text = c"\x01 weird \xff bytes\t";
        list.append("cs_local", Value::from(text)).unwrap();
        let options = list.finalize().unwrap();
        assert_eq!(options.get("cs_local").unwrap().text(), Some(text));
    }

    #[test]
    fn binary_values_are_verbatim() {
        let mut list = OptionList::new();
        list.append("export", Value::Binary(&[0, 1, 0, 2])).unwrap();
        let options = list.finalize().unwrap();
        assert_eq!(
            options.get("export").unwrap().value,
            Some([0, 1, 0, 2].as_slice())
        );
    }

    #[test]
    fn absent_values_stay_absent() {
        let mut list = OptionList::new();
        list.append("rdonly", Value::Absent).unwrap();
        list.append("from", Value::from(None)).unwrap();
        let options = list.finalize().unwrap();
        assert_eq!(options.len(), 4);
        assert!(options.entries().all(|entry| entry.value.is_none()));
    }

    #[test]
    fn appends_keep_order_and_content() {
        let mut list = OptionList::new();
        let mut capacities = vec![];
        for i in 0..100 {
            list.append_formatted(&format!("key{i}"), format_args!("{i}"))
                .unwrap();
            capacities.push(list.capacity());
        }
        let options = list.finalize().unwrap();
        assert_eq!(options.len(), 200);
        for (i, entry) in options.entries().enumerate() {
            assert_eq!(entry.name.to_str().unwrap(), format!("key{i}"));
            assert_eq!(entry.text().unwrap().to_str().unwrap(), i.to_string());
        }
        assert!(capacities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn growth_at_least_doubles() {
        let mut list = OptionList::new();
        let mut previous = list.capacity();
        for _ in 0..50 {
            list.append("k", Value::Absent).unwrap();
            let capacity = list.capacity();
            if capacity != previous {
                assert!(capacity >= previous * 2);
                assert!(capacity >= list.len());
                previous = capacity;
            }
        }
    }

    #[rstest]
    #[case("norrip", true, "norrip")]
    #[case("norrip", false, "rrip")]
    #[case("nohave_nls", false, "have_nls")]
    #[case("nox", true, "nox")]
    #[case("nox", false, "x")]
    fn flags(#[case] name: &str, #[case] active: bool, #[case] expected: &str) {
        let mut list = OptionList::new();
        list.append_flag(name, active).unwrap();
        let options = list.finalize().unwrap();
        assert_eq!(names(options), vec![expected]);
        assert_eq!(options.get(expected).unwrap().value, None);
    }

    #[rstest]
    #[case("no")]
    #[case("n")]
    #[case("")]
    #[case("rrip")]
    #[case("NOrrip")]
    fn badly_named_flag_is_contract_violation(#[case] name: &str) {
        let mut list = OptionList::new();
        assert_matches!(
            list.append_flag(name, true),
            Err(TranslationError::ContractViolation)
        );
        assert_matches!(
            list.finalize(),
            Err(TranslationError::ContractViolation)
        );
    }

    #[test]
    fn name_with_nul_is_contract_violation() {
        let mut list = OptionList::new();
        assert_matches!(
            list.append("fs\0type", Value::Absent),
            Err(TranslationError::ContractViolation)
        );
        assert!(list.is_empty());
    }

    #[test]
    fn format_overflow_adds_nothing() {
        let mut list = OptionList::new();
        list.append("fstype", Value::Text(b"ufs")).unwrap();
        let long = "9".repeat(scratch::SCRATCH_LEN + 1);
        assert_matches!(
            list.append_formatted("ssector", format_args!("{long}")),
            Err(TranslationError::FormatOverflow)
        );
        assert_eq!(list.len(), 2);
        assert_matches!(list.finalize(), Err(TranslationError::FormatOverflow));
    }

    #[test]
    fn failure_is_sticky() {
        let mut list = OptionList::new();
        list.append("fstype", Value::Text(b"ufs")).unwrap();
        list.append_flag("bad", true).unwrap_err();
        assert_matches!(
            list.append("fspath", Value::Text(b"/mnt")),
            Err(TranslationError::ContractViolation)
        );
        assert_matches!(
            list.append_formatted("ssector", format_args!("{}", 1)),
            Err(TranslationError::ContractViolation)
        );
        assert_matches!(
            list.append_flag("norrip", true),
            Err(TranslationError::ContractViolation)
        );
        assert_eq!(list.len(), 2);
        assert_eq!(list.failure(), Some(TranslationError::ContractViolation));
    }

    #[test]
    fn first_failure_wins() {
        let mut list = OptionList::new();
        let long = "9".repeat(scratch::SCRATCH_LEN);
        list.append_formatted("a", format_args!("{long}"))
            .unwrap_err();
        list.append_flag("b", true).unwrap_err();
        assert_matches!(list.finalize(), Err(TranslationError::FormatOverflow));
    }

    #[test]
    fn release_is_idempotent() {
        let mut list = OptionList::new();
        list.release();
        list.append("fstype", Value::Text(b"ufs")).unwrap();
        list.release();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 0);
        list.release();
        assert!(list.finalize().unwrap().is_empty());
    }

    #[test]
    fn release_clears_failure() {
        let mut list = OptionList::new();
        list.append_flag("x", true).unwrap_err();
        list.release();
        assert_eq!(list.failure(), None);
        list.append("fstype", Value::Text(b"ufs")).unwrap();
        assert_eq!(list.finalize().unwrap().len(), 2);
    }
}
