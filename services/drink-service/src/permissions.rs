//! Permission strings the identity provider grants for drink operations.

common_auth::permissions! {
    /// Read full recipes, ingredient names included.
    GetDrinksDetail => "get:drinks-detail",
    PostDrinks => "post:drinks",
    PatchDrinks => "patch:drinks",
    DeleteDrinks => "delete:drinks",
}
