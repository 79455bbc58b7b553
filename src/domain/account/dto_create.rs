#[derive(Debug, Clone)]
pub struct CreateAccountDto {
    pub email: String,
    pub username: String,
    pub password: String,
}
