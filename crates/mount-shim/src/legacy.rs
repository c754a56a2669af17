//! Access to the caller's legacy argument struct.

use crate::{TranslationError, Value};
use mount_shim_sys::abi::LegacyLayout;
use std::{
    any::TypeId,
    ffi::{c_char, c_void, CStr},
    marker::PhantomData,
    ptr::NonNull,
};

/// A borrowed pointer to the `data` argument of a legacy `mount(2)` call.
///
/// The struct behind the pointer is whatever the kernel expects for the requested filesystem
/// type. When it was created from a typed reference, the type is remembered and checked when an
/// encoder reads it.
#[derive(Clone, Copy, Debug)]
pub struct LegacyArgs<'a> {
    ptr: NonNull<c_void>,
    layout: Option<TypeId>,
    _marker: PhantomData<&'a c_void>,
}

impl<'a> LegacyArgs<'a> {
    /// # Safety
    ///
    /// Every byte of `*args`, padding included, must be initialized, as for
    /// [`mount_shim_sys::abi::bytes_of`]. Every string pointer in `args` must be null or point to
    /// a NUL-terminated string that lives at least as long as `'a`.
    pub unsafe fn new<T: LegacyLayout>(args: &'a T) -> Self {
        Self {
            ptr: NonNull::from(args).cast(),
            layout: Some(TypeId::of::<T>()),
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to a struct of the layout the kernel expects for the filesystem type it
    /// is used with, valid for `'a`. Its bytes and the string pointers it contains must satisfy the
    /// same requirements as for [`LegacyArgs::new`]. Memory written by a C caller does.
    pub unsafe fn from_raw(ptr: NonNull<c_void>) -> Self {
        Self {
            ptr,
            layout: None,
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// View the arguments as a `T`. Fails if they are known to be something else.
    pub(crate) fn cast<T: LegacyLayout>(&self) -> Result<&'a T, TranslationError> {
        match self.layout {
            Some(layout) if layout != TypeId::of::<T>() => {
                Err(TranslationError::ContractViolation)
            }
            _ => Ok(unsafe { self.ptr.cast::<T>().as_ref() }),
        }
    }

    /// A string field of the arguments. A null pointer means there is no value.
    pub(crate) fn text(&self, ptr: *const c_char) -> Value<'a> {
        if ptr.is_null() {
            Value::Absent
        } else {
            Value::from(unsafe { CStr::from_ptr(ptr) })
        }
    }
}

/// The text held in a fixed-size character array field: everything up to the first NUL, or the
/// whole field if it has none.
pub(crate) fn bounded_text(field: &[u8]) -> &[u8] {
    let len = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    &field[..len]
}
