pub mod forms;
pub mod id_token;
pub mod oauth;

pub use forms::{DisabledForms, FormCreator, FormRequest, GoogleFormsClient};
pub use id_token::{DisabledSignIn, GoogleIdTokenVerifier, IdTokenVerifier};
pub use oauth::{AccessTokenSource, RefreshCredentials};
