use crate::util::constants::BYTES_IN_WORD;
use crate::util::Address;
use crate::vm::slot::{NarrowOopEncoding, RefEncoding};
use std::default::Default;

fn always_valid<T>(_: &T) -> bool {
    true
}

macro_rules! options {
    ($($name:ident: $type:ty[$validator:expr] = $default:expr),*,) => [
        options!($($name: $type[$validator] = $default),*);
    ];
    ($($name:ident: $type:ty[$validator:expr] = $default:expr),*) => [
        #[derive(Clone, Debug)]
        pub struct Options {
            $(pub $name: $type),*
        }
        impl Options {
            /// Set an option from its snake_case name and a string value. Returns false and keeps
            /// the current value if the value cannot be parsed or is invalid. Panics if `s` is
            /// not the name of an option.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> bool {
                match s {
                    // Parse the given value from str (by env vars or by calling set_option()) to the right type
                    $(stringify!($name) => if let Ok(ref val) = val.parse::<$type>() {
                        // Validate
                        let validate_fn = $validator;
                        let is_valid = validate_fn(val);
                        if is_valid {
                            // Only set value if valid.
                            self.$name = val.clone();
                        } else {
                            warn!("Unable to set {}={:?}. Invalid value. Default value will be used.", s, val);
                        }
                        is_valid
                    } else {
                        warn!("Unable to set {}={:?}. Cant parse value. Default value will be used.", s, val);
                        false
                    })*
                    _ => panic!("Invalid Options key: {}", s)
                }
            }

            /// Is `s` the name of an option?
            pub fn is_option(s: &str) -> bool {
                matches!(s, $(stringify!($name))|*)
            }
        }
        impl Default for Options {
            fn default() -> Self {
                let mut options = Options {
                    $($name: $default),*
                };

                // If we have env vars that start with BARRIER_SET_ and match any option (such as BARRIER_SET_COMPRESSED_OOPS),
                // we set the option to its value (if it is a valid value). Otherwise, use the default value.
                const PREFIX: &str = "BARRIER_SET_";
                for (key, val) in std::env::vars() {
                    // strip the prefix, and get the lower case string
                    if let Some(rest_of_key) = key.strip_prefix(PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => { options.set_from_str(lowercase, &val); },)*
                            _ => {}
                        }
                    }
                }
                options
            }
        }
    ]
}

options! {
    // Are reference fields in the heap 32-bit narrow references? This decides the slot width the static array barriers assume.
    compressed_oops:            bool  [always_valid] = false,
    // The heap base narrow references are relative to. Must be word aligned.
    compressed_oops_base:       usize [|v: &usize| *v % BYTES_IN_WORD == 0] = 0,
    // The shift applied to narrow references. Objects are at least 8-byte aligned, so the shift cannot exceed 3.
    compressed_oops_shift:      u8    [|v: &u8| *v <= 3] = 3,
    // Check the alignment of covered regions when the barrier set is installed or resized.
    verify_covered_regions:     bool  [always_valid] = cfg!(debug_assertions),
    // Print the barrier set when it is installed.
    print_barrier_set:          bool  [always_valid] = false,
    // Count calls to the static array barrier entry points.
    count_static_barrier_calls: bool  [always_valid] = false,
}

impl Options {
    /// Set an option whose name may be in camelCase (such as `compressedOops`) or snake_case.
    pub fn set_from_camelcase_str(&mut self, s: &str, val: &str) -> bool {
        trace!("Trying to process option pair: ({}, {})", s, val);

        let mut sr = String::with_capacity(s.len());
        for c in s.chars() {
            if c.is_uppercase() {
                sr.push('_');
                for c in c.to_lowercase() {
                    sr.push(c);
                }
            } else {
                sr.push(c)
            }
        }

        let result = self.set_from_str(sr.as_str(), val);

        if result {
            trace!("Validation passed");
        } else {
            trace!("Validation failed")
        }
        result
    }

    /// Set options in bulk from a string of whitespace separated `name=value` pairs, such as
    /// `"compressed_oops=true compressed_oops_shift=0"`. Every pair is processed. Returns false if
    /// any pair is malformed or names an unknown option, or if any value is rejected.
    pub fn set_bulk_from_str(&mut self, options: &str) -> bool {
        let mut all_ok = true;
        for opt in options.split_ascii_whitespace() {
            let Some((key, val)) = opt.split_once('=') else {
                warn!("Unable to parse option {:?}. Expected name=value.", opt);
                all_ok = false;
                continue;
            };
            if !Options::is_option(key) {
                warn!("Unknown option {:?}. Ignored.", key);
                all_ok = false;
                continue;
            }
            all_ok &= self.set_from_str(key, val);
        }
        all_ok
    }

    /// The layout of reference slots these options describe.
    pub fn reference_encoding(&self) -> RefEncoding {
        if self.compressed_oops {
            RefEncoding::Compressed(NarrowOopEncoding::new(
                unsafe { Address::from_usize(self.compressed_oops_base) },
                self.compressed_oops_shift,
            ))
        } else {
            RefEncoding::Full
        }
    }
}
