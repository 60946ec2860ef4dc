mod supabase_key;

pub use supabase_key::SupabaseKey;
