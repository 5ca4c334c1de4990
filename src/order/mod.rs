//! Schema-ordered sorting and searching of sibling elements.

mod compare;
mod search;

pub use compare::{compare_siblings, first_inversion, sort_children, sort_tree, verify_sorted, verify_sorted_tree};
pub use search::{ChildQuery, find, find_matching_child, insert_position, insert_sorted, linear_match};
