pub mod normalizer;
pub mod openai;
pub mod persistence;
pub mod processor;
pub mod session;
pub mod validator;
