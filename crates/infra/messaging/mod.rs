pub mod delivery;
pub mod whatsapp;
