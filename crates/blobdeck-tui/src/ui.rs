pub(crate) mod binary_choice;
pub(crate) mod choice_list;
pub(crate) mod loading;
pub(crate) mod log_view;
pub(crate) mod message;
pub(crate) mod modal;
pub(crate) mod page_table;
pub(crate) mod prompt;
pub(crate) mod text;
