/// Gallery candidates: AVAILABLE items annotated with the full-text relevance
/// of the search string ($1) against name + description. Ordering and
/// windowing happen in the paging engine.
pub const SELECT_AVAILABLE_LISTINGS: &str = r#"
    SELECT i.id, i.name, i.posted_date, i.deadline, i.price, i.negotiable, i.condition,
           i.description, i.image,
           ts_rank_cd(to_tsvector('english', i.name || ' ' || i.description),
                      plainto_tsquery('english', $1))::float4 AS rank,
           COALESCE((SELECT array_agg(ic.category_id)
                     FROM item_categories ic WHERE ic.item_id = i.id), '{}'::bigint[]) AS categories,
           COALESCE((SELECT array_agg(a.image::text ORDER BY a.id)
                     FROM album_images a WHERE a.item_id = i.id), '{}'::text[]) AS album,
           s.contact, s.email
    FROM items i
    JOIN accounts s ON s.id = i.seller_id
    WHERE i.status = 0
"#;

/// Item-request gallery candidates; same shape, no status gate, empty album.
pub const SELECT_ITEM_REQUEST_LISTINGS: &str = r#"
    SELECT r.id, r.name, r.posted_date, r.deadline, r.price, r.negotiable, r.condition,
           r.description, r.image,
           ts_rank_cd(to_tsvector('english', r.name || ' ' || r.description),
                      plainto_tsquery('english', $1))::float4 AS rank,
           COALESCE((SELECT array_agg(rc.category_id)
                     FROM item_request_categories rc WHERE rc.item_request_id = r.id), '{}'::bigint[]) AS categories,
           '{}'::text[] AS album,
           a.contact, a.email
    FROM item_requests r
    JOIN accounts a ON a.id = r.requester_id
"#;

pub const GET_ITEM: &str = "SELECT id, seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status FROM items WHERE id = $1";

pub const GET_ITEM_FOR_UPDATE: &str = "SELECT id, seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status FROM items WHERE id = $1 FOR UPDATE";

pub const LIST_OWN_ITEMS: &str = "SELECT id, seller_id, name, posted_date, deadline, price, negotiable, condition, description, image, status FROM items WHERE seller_id = $1 ORDER BY posted_date DESC";

pub const GET_ITEM_REQUEST: &str = "SELECT id, requester_id, name, posted_date, deadline, price, negotiable, condition, description, image FROM item_requests WHERE id = $1";

pub const LIST_OWN_ITEM_REQUESTS: &str = "SELECT id, requester_id, name, posted_date, deadline, price, negotiable, condition, description, image FROM item_requests WHERE requester_id = $1 ORDER BY posted_date DESC";

pub const LIST_CATEGORIES: &str = "SELECT id, name, description FROM categories ORDER BY name";
