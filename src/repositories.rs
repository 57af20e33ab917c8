use crate::models::{
    Author, Book, CreateAuthorError, CreateAuthorRequest, CreateBookError, CreateBookRequest,
    CreateUserError, CreateUserRequest, Credentials, DeleteAuthorError, DeleteAuthorRequest,
    DeleteBookError, DeleteBookRequest, FindAllAuthorsError, FindAllBooksError, FindAuthorError,
    FindAuthorRequest, FindBookError, FindBookRequest, IssueTokenError, Principal,
    ResolveTokenError, Token, UpdateAuthorError, UpdateAuthorRequest, UpdateBookError,
    UpdateBookRequest, VerifyCredentialsError,
};
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError>;

    async fn find_author(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError>;

    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError>;

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError>;

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError>;
}

/// Book persistence. Writes that set `author_id` report a missing author as
/// `AuthorNotFound`, decided by the write statement itself.
#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError>;

    async fn find_book(&self, req: &FindBookRequest) -> Result<Book, FindBookError>;

    async fn find_all_books(&self) -> Result<Vec<Book>, FindAllBooksError>;

    async fn update_book(&self, req: &UpdateBookRequest) -> Result<Book, UpdateBookError>;

    async fn delete_book(&self, req: &DeleteBookRequest) -> Result<(), DeleteBookError>;
}

/// Account store that owns username/password verification.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn create_user(&self, req: &CreateUserRequest) -> Result<Principal, CreateUserError>;

    async fn verify_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Principal, VerifyCredentialsError>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Returns the principal's token, minting one on first use.
    async fn find_or_create_token(&self, principal: &Principal) -> Result<Token, IssueTokenError>;

    async fn find_principal(&self, key: &str) -> Result<Principal, ResolveTokenError>;
}
