pub mod client_form;
pub mod data_table;
pub mod field_error;
pub mod header;
pub mod login_form;
pub mod modal_host;
pub mod pagination;
pub mod panels;
pub mod pet_form;
pub mod search_bar;
pub mod toast_host;
