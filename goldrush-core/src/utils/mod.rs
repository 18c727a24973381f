/*!
Module providing different function tools and data structures.
*/

pub mod confy;
pub mod geometry;

use std::sync::{Arc, Mutex};

pub type SharedMutex<T> = Arc<Mutex<T>>;
