use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::member::{Member, MemberChanges, NewMember};

fn row_to_member(row: sqlx::sqlite::SqliteRow) -> Member {
    Member {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        birthday: row.get("birthday"),
        country: row.get("country"),
        city: row.get("city"),
        district: row.get("district"),
        address: row.get("address"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_MEMBERS: &str = "SELECT id, name, email, phone, birthday, country, city, district, address, created_at, updated_at FROM members";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%SZ', 'now')";

pub async fn list_members(pool: &SqlitePool) -> Result<Vec<Member>, AppError> {
    let rows = sqlx::query(&format!("{SELECT_MEMBERS} ORDER BY id ASC"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(row_to_member).collect())
}

pub async fn get_member(pool: &SqlitePool, id: i64) -> Result<Member, AppError> {
    let row = sqlx::query(&format!("{SELECT_MEMBERS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("member not found".to_string()))?;

    Ok(row_to_member(row))
}

/// Exact, case-sensitive match. `except` skips the member being updated.
pub async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    except: Option<i64>,
) -> Result<bool, AppError> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM members WHERE email = ? AND id IS NOT ?)")
        .bind(email)
        .bind(except)
        .fetch_one(pool)
        .await?;

    Ok(row.get::<i64, _>(0) != 0)
}

pub async fn count_members(pool: &SqlitePool) -> Result<i64, AppError> {
    let row = sqlx::query("SELECT COUNT(*) FROM members")
        .fetch_one(pool)
        .await?;
    Ok(row.get(0))
}

pub async fn create_member(pool: &SqlitePool, input: &NewMember) -> Result<Member, AppError> {
    let result = sqlx::query(
        "INSERT INTO members (name, email, phone, birthday, country, city, district, address) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.birthday)
    .bind(&input.country)
    .bind(&input.city)
    .bind(&input.district)
    .bind(&input.address)
    .execute(pool)
    .await?;

    get_member(pool, result.last_insert_rowid()).await
}

/// Applies only the supplied columns in a single statement, so a rejected
/// write (e.g. the email constraint) leaves the row untouched.
pub async fn update_member(
    pool: &SqlitePool,
    id: i64,
    input: &MemberChanges,
) -> Result<Member, AppError> {
    let mut sets = Vec::new();
    let mut values: Vec<Option<String>> = Vec::new();

    if let Some(ref name) = input.name {
        sets.push("name = ?");
        values.push(Some(name.clone()));
    }
    if let Some(ref email) = input.email {
        sets.push("email = ?");
        values.push(Some(email.clone()));
    }
    if let Some(ref phone) = input.phone {
        sets.push("phone = ?");
        values.push(phone.clone());
    }
    if let Some(birthday) = input.birthday {
        sets.push("birthday = ?");
        values.push(birthday.map(|d| d.format("%Y-%m-%d").to_string()));
    }
    if let Some(ref country) = input.country {
        sets.push("country = ?");
        values.push(country.clone());
    }
    if let Some(ref city) = input.city {
        sets.push("city = ?");
        values.push(city.clone());
    }
    if let Some(ref district) = input.district {
        sets.push("district = ?");
        values.push(district.clone());
    }
    if let Some(ref address) = input.address {
        sets.push("address = ?");
        values.push(address.clone());
    }

    if sets.is_empty() {
        return get_member(pool, id).await;
    }

    let query = format!(
        "UPDATE members SET {}, updated_at = {NOW} WHERE id = ?",
        sets.join(", ")
    );
    let mut q = sqlx::query(&query);
    for v in &values {
        q = q.bind(v);
    }
    let result = q.bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("member not found".to_string()));
    }

    get_member(pool, id).await
}

pub async fn delete_member(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("member not found".to_string()));
    }
    Ok(())
}
